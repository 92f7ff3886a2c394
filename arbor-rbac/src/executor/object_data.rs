//! Checks for application records governed by an object

use super::Executor;
use crate::error::RbacResult;
use crate::models::{Action, ObjectData, ObjectType};

impl Executor {
    /// Keep the records the current user may perform `action` on
    pub async fn filter_object_data<D: ObjectData>(
        &self,
        items: Vec<D>,
        action: Action,
    ) -> RbacResult<Vec<D>> {
        let (user, domain) = self.current().await?;
        self.filter(&user, &domain, action, items).await
    }

    pub async fn enforce<D: ObjectData + ?Sized>(
        &self,
        item: &D,
        action: Action,
    ) -> RbacResult<()> {
        self.check(item, action).await
    }

    pub async fn create_object_data_check<D: ObjectData + ?Sized>(
        &self,
        item: &D,
        ty: &ObjectType,
    ) -> RbacResult<()> {
        self.write_object_data_check(item, ty).await
    }

    pub async fn recover_object_data_check<D: ObjectData + ?Sized>(
        &self,
        item: &D,
        ty: &ObjectType,
    ) -> RbacResult<()> {
        self.write_object_data_check(item, ty).await
    }

    pub async fn delete_object_data_check<D: ObjectData + ?Sized>(
        &self,
        item: &D,
        ty: &ObjectType,
    ) -> RbacResult<()> {
        self.write_object_data_check(item, ty).await
    }

    /// Moving a record to another object needs Write on both objects
    pub async fn update_object_data_check<D, O>(
        &self,
        item: &D,
        old: &O,
        ty: &ObjectType,
    ) -> RbacResult<()>
    where
        D: ObjectData + ?Sized,
        O: ObjectData + ?Sized,
    {
        if old.object_id() != item.object_id() {
            self.write_object_data_check(old, ty).await?;
        }
        self.write_object_data_check(item, ty).await
    }
}
