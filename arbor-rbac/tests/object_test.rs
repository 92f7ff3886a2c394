//! Object workflow and object data scenarios

mod common;

use arbor_rbac::{Action, EnforcementEngine, Object, ObjectData, ObjectType, RbacError, ROOT_ID};
use common::{object_names, Stage};

/// Application record kept outside the authorization layer
#[derive(Debug, Clone)]
struct Document {
    title: &'static str,
    object_id: u64,
}

impl ObjectData for Document {
    fn object_id(&self) -> u64 {
        self.object_id
    }
}

#[tokio::test]
async fn test_object_visibility_and_type_filter() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;

    stage.act_as(&stage.admin);
    let docs = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();

    let all = stage.executor.get_objects(None).await.unwrap();
    assert_eq!(
        object_names(&all),
        vec!["docs", "object_root", "role_member", "role_root"]
    );
    let typed = stage
        .executor
        .get_objects(Some(&ObjectType::object()))
        .await
        .unwrap();
    assert_eq!(object_names(&typed), vec!["docs", "object_root"]);
    let listed = typed.iter().find(|o| o.id == docs.id).unwrap();
    assert_eq!(listed.parent_id, object_root.id);

    // member reads the object tree only
    stage.act_as(&stage.member);
    let visible = stage.executor.get_objects(None).await.unwrap();
    assert_eq!(object_names(&visible), vec!["docs", "object_root"]);
}

#[tokio::test]
async fn test_member_cannot_write_objects() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;

    stage.act_as(&stage.member);
    let err = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::NoWritePermission));

    let err = stage.executor.delete_object(&object_root).await.unwrap_err();
    assert!(matches!(err, RbacError::NoWritePermission));
}

#[tokio::test]
async fn test_root_objects_need_superadmin() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;

    stage.act_as(&stage.admin);
    let err = stage
        .executor
        .create_object(Object::new("vault", ObjectType::object(), ROOT_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::CannotOperateRootWithoutSuperadmin));

    let err = stage.executor.delete_object(&object_root).await.unwrap_err();
    assert!(matches!(err, RbacError::CannotOperateRootWithoutSuperadmin));

    stage.act_as(&stage.superadmin);
    let vault = stage
        .executor
        .create_object(Object::new("vault", ObjectType::object(), ROOT_ID))
        .await
        .unwrap();

    // no grant covers the new root, so admin cannot see it
    stage.act_as(&stage.admin);
    let visible = stage.executor.get_objects(None).await.unwrap();
    assert!(visible.iter().all(|o| o.id != vault.id));

    let mut renamed = object_root.clone();
    renamed.name = "objects".into();
    let err = stage.executor.update_object(renamed).await.unwrap_err();
    assert!(matches!(err, RbacError::CannotOperateRootWithoutSuperadmin));

    let docs = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();
    let mut lifted = docs.clone();
    lifted.parent_id = ROOT_ID;
    let err = stage.executor.update_object(lifted.clone()).await.unwrap_err();
    assert!(matches!(err, RbacError::CannotOperateRootWithoutSuperadmin));

    stage.act_as(&stage.superadmin);
    stage.executor.update_object(lifted).await.unwrap();
    assert!(stage
        .arbor
        .engine()
        .get_parents_for_object_in_domain(&docs, &stage.domain)
        .await
        .unwrap()
        .is_empty());

    let mut renamed = vault.clone();
    renamed.name = "safe".into();
    stage.executor.update_object(renamed.clone()).await.unwrap();
    stage.executor.delete_object(&renamed).await.unwrap();
    let typed = stage
        .executor
        .get_objects(Some(&ObjectType::object()))
        .await
        .unwrap();
    assert_eq!(object_names(&typed), vec!["docs", "object_root"]);
}

#[tokio::test]
async fn test_update_object_rules() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;
    let engine = stage.arbor.engine();

    stage.act_as(&stage.admin);
    let docs = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();
    let drafts = stage
        .executor
        .create_object(Object::new("drafts", ObjectType::object(), docs.id))
        .await
        .unwrap();

    let mut retyped = docs.clone();
    retyped.object_type = ObjectType::role();
    let err = stage.executor.update_object(retyped).await.unwrap_err();
    assert!(matches!(err, RbacError::InvalidObjectType));

    let mut looped = docs.clone();
    looped.parent_id = drafts.id;
    let err = stage.executor.update_object(looped).await.unwrap_err();
    assert!(matches!(err, RbacError::CircularHierarchy));

    let mut moved = drafts.clone();
    moved.parent_id = object_root.id;
    moved.name = "archive".into();
    stage.executor.update_object(moved).await.unwrap();
    let parents = engine
        .get_parents_for_object_in_domain(&drafts, &stage.domain)
        .await
        .unwrap();
    assert_eq!(parents.iter().map(|o| o.id).collect::<Vec<_>>(), vec![object_root.id]);
    assert!(engine
        .get_children_for_object_in_domain(&docs, &stage.domain)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_and_recover_object() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;

    stage.act_as(&stage.admin);
    let docs = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();
    stage.executor.delete_object(&docs).await.unwrap();

    let typed = stage
        .executor
        .get_objects(Some(&ObjectType::object()))
        .await
        .unwrap();
    assert_eq!(object_names(&typed), vec!["object_root"]);

    let err = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::AlreadyExists));

    let recovered = stage
        .executor
        .recover_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();
    assert_eq!(recovered.id, docs.id);
    assert_eq!(stage.executor.get_objects(None).await.unwrap().len(), 4);

    let err = stage
        .executor
        .recover_object(Object::new("never", ObjectType::object(), object_root.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::NotExists));
}

#[tokio::test]
async fn test_recover_object_needs_live_writable_parent() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;

    stage.act_as(&stage.admin);
    let docs = stage
        .executor
        .create_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();
    let drafts = stage
        .executor
        .create_object(Object::new("drafts", ObjectType::object(), docs.id))
        .await
        .unwrap();
    stage.executor.delete_object(&drafts).await.unwrap();
    stage.executor.delete_object(&docs).await.unwrap();

    let err = stage
        .executor
        .recover_object(Object::new("drafts", ObjectType::object(), docs.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::NotExists));

    stage.act_as(&stage.member);
    let err = stage
        .executor
        .recover_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::NoWritePermission));

    stage.act_as(&stage.admin);
    stage
        .executor
        .recover_object(Object::new("docs", ObjectType::object(), object_root.id))
        .await
        .unwrap();
    let recovered = stage
        .executor
        .recover_object(Object::new("drafts", ObjectType::object(), docs.id))
        .await
        .unwrap();
    let parents = stage
        .arbor
        .engine()
        .get_parents_for_object_in_domain(&recovered, &stage.domain)
        .await
        .unwrap();
    assert_eq!(parents.iter().map(|o| o.id).collect::<Vec<_>>(), vec![docs.id]);
}

#[tokio::test]
async fn test_object_data_checks() {
    let stage = Stage::new().await;
    let object_root = stage.object("object_root").await;
    let role_root = stage.object("role_root").await;

    let readme = Document {
        title: "readme",
        object_id: object_root.id,
    };
    let roster = Document {
        title: "roster",
        object_id: role_root.id,
    };

    stage.act_as(&stage.member);
    stage.executor.enforce(&readme, Action::Read).await.unwrap();
    let err = stage.executor.enforce(&readme, Action::Write).await.unwrap_err();
    assert!(matches!(err, RbacError::NoWritePermission));
    let err = stage
        .executor
        .create_object_data_check(&readme, &ObjectType::object())
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::NoWritePermission));

    let kept = stage
        .executor
        .filter_object_data(vec![roster.clone(), readme.clone()], Action::Read)
        .await
        .unwrap();
    assert_eq!(kept.iter().map(|d| d.title).collect::<Vec<_>>(), vec!["readme"]);

    stage.act_as(&stage.admin);
    stage
        .executor
        .create_object_data_check(&readme, &ObjectType::object())
        .await
        .unwrap();
    let err = stage
        .executor
        .delete_object_data_check(&readme, &ObjectType::role())
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::InvalidObjectType));

    // moving a record checks its old object too
    let err = stage
        .executor
        .update_object_data_check(&readme, &roster, &ObjectType::object())
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::InvalidObjectType));
    stage
        .executor
        .update_object_data_check(&readme, &readme, &ObjectType::object())
        .await
        .unwrap();

    stage.act_as(&stage.superadmin);
    let orphan = Document {
        title: "orphan",
        object_id: 99,
    };
    let err = stage
        .executor
        .recover_object_data_check(&orphan, &ObjectType::object())
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::InvalidObject));
}
