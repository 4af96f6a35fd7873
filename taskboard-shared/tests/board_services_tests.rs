/// Integration tests for the project, membership and board services
///
/// These run against the in-memory store, so no database is needed.
/// Run with: cargo test --test board_services_tests

use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::models::project::ProjectRole;
use taskboard_shared::models::task::TaskPriority;
use taskboard_shared::models::user::{CreateUser, UserRole};
use taskboard_shared::services::board::{self, TaskInput, TaskPatch};
use taskboard_shared::services::projects::{self, NewProjectInput};
use taskboard_shared::services::ServiceError;
use taskboard_shared::store::Stores;
use uuid::Uuid;

async fn create_user(stores: &Stores, name: &str, role: UserRole) -> AuthContext {
    let user = stores
        .users
        .create_user(CreateUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "not-a-real-hash".to_string(),
            role,
        })
        .await
        .expect("Failed to create user");
    AuthContext::from_user(&user)
}

async fn create_launch(stores: &Stores, owner: &AuthContext) -> Uuid {
    projects::create_project(
        stores,
        owner,
        NewProjectInput {
            name: "Launch".to_string(),
            description: None,
        },
    )
    .await
    .expect("Failed to create project")
    .id
}

fn titled(title: &str) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_launch_scenario() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let b = create_user(&stores, "Bob", UserRole::Member).await;

    // A creates the project and is its only member
    let project = projects::create_project(
        &stores,
        &a,
        NewProjectInput {
            name: "Launch".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(project.members.len(), 1);
    assert!(project.members[0].user.refers_to(a.user_id));
    assert_eq!(project.members[0].role, ProjectRole::Owner);

    // A issues an invite, B redeems it as an editor and the token is consumed
    let tok1 = projects::generate_invite(&stores, &a, project.id).await.unwrap();
    let joined = projects::join_by_token(&stores, &b, &tok1).await.unwrap();
    assert_eq!(joined.id, project.id);
    assert_eq!(joined.name, "Launch");

    let detail = projects::project_detail(&stores, &a, project.id).await.unwrap();
    let b_entry = detail
        .members
        .iter()
        .find(|m| m.user.refers_to(b.user_id))
        .expect("B should be a member");
    assert_eq!(b_entry.role, ProjectRole::Editor);
    assert_eq!(detail.invite_token, None);

    // Editors can't issue invites
    let err = projects::generate_invite(&stores, &b, project.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // A creates a task with no assignee
    let task = board::create_task(&stores, &a, project.id, titled("Draft outline"))
        .await
        .unwrap();
    assert_eq!(task.status, "todo");
    assert_eq!(task.priority, TaskPriority::Medium);
    assert!(task.assigned_to.is_none());

    // A moves it to done
    let task = board::move_task(&stores, &a, project.id, task.id, "done", false)
        .await
        .unwrap();
    assert_eq!(task.status, "done");

    // B comments
    let task = board::add_comment(&stores, &b, project.id, task.id, "LGTM")
        .await
        .unwrap();
    assert_eq!(task.comments.len(), 1);
    let comment = &task.comments[0];
    assert!(comment.user.refers_to(b.user_id));
    assert_eq!(comment.user.resolved().map(|u| u.name.as_str()), Some("Bob"));

    // A, the owner, still can't delete B's comment
    let err = board::delete_comment(&stores, &a, project.id, task.id, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // A kicks B, then can't kick themselves
    let after_kick = projects::kick_member(&stores, &a, project.id, b.user_id)
        .await
        .unwrap();
    assert!(!after_kick.involves(b.user_id));

    let err = projects::kick_member(&stores, &a, project.id, a.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_invite_token_is_single_use() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let b = create_user(&stores, "Bob", UserRole::Member).await;
    let c = create_user(&stores, "Cy", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;

    let token = projects::generate_invite(&stores, &a, project_id).await.unwrap();
    projects::join_by_token(&stores, &b, &token).await.unwrap();

    let err = projects::join_by_token(&stores, &c, &token).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = projects::join_by_token(&stores, &b, &token).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_active_tokens_are_distinct_across_projects() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;

    let mut tokens = Vec::new();
    for _ in 0..5 {
        let project_id = create_launch(&stores, &a).await;
        tokens.push(projects::generate_invite(&stores, &a, project_id).await.unwrap());
    }

    let mut unique = tokens.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), tokens.len());
}

#[tokio::test]
async fn test_owner_never_duplicated_in_members() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let b = create_user(&stores, "Bob", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;

    // Direct add of the owner and joining the owner's own invite both conflict
    let err = projects::add_member_direct(&stores, &a, project_id, a.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let token = projects::generate_invite(&stores, &a, project_id).await.unwrap();
    let err = projects::join_by_token(&stores, &a, &token).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    projects::join_by_token(&stores, &b, &token).await.unwrap();

    let project = projects::project_detail(&stores, &a, project_id).await.unwrap();
    let owner_entries = project
        .members
        .iter()
        .filter(|m| m.user.refers_to(a.user_id))
        .count();
    assert_eq!(owner_entries, 1);
    assert_eq!(project.members.len(), 2);
}

#[tokio::test]
async fn test_default_columns_are_idempotent() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;

    let first = board::get_board(&stores, &a, project_id).await.unwrap();
    let keys: Vec<(&str, i32)> = first
        .columns
        .iter()
        .map(|c| (c.column_key.as_str(), c.position))
        .collect();
    assert_eq!(keys, vec![("todo", 1), ("in-progress", 2), ("done", 3)]);

    let second = board::get_board(&stores, &a, project_id).await.unwrap();
    assert_eq!(second.columns, first.columns);
    assert_eq!(stores.boards.list_columns(project_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_board_view_resolves_users() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let b = create_user(&stores, "Bob", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;
    projects::add_member_direct(&stores, &a, project_id, b.user_id)
        .await
        .unwrap();

    board::create_task(
        &stores,
        &a,
        project_id,
        TaskInput {
            title: "Ship it".to_string(),
            assigned_to: Some(b.user_id.to_string()),
            priority: Some(TaskPriority::High),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let view = board::get_board(&stores, &b, project_id).await.unwrap();
    assert_eq!(view.project_name, "Launch");
    assert_eq!(view.owner.resolved().map(|u| u.email.as_str()), Some("ada@example.com"));
    assert!(view.members.iter().all(|m| m.user.resolved().is_some()));
    assert_eq!(view.tasks.len(), 1);

    let assignee = view.tasks[0].assigned_to.as_ref().expect("assignee");
    assert_eq!(assignee.resolved().map(|u| u.name.as_str()), Some("Bob"));
}

#[tokio::test]
async fn test_board_requires_membership() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let outsider = create_user(&stores, "Eve", UserRole::Member).await;
    let admin = create_user(&stores, "Root", UserRole::Admin).await;
    let project_id = create_launch(&stores, &a).await;

    let err = board::get_board(&stores, &outsider, project_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = board::create_task(&stores, &outsider, project_id, titled("Sneaky"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // System admins see project detail and may manage it, but not the board
    assert!(projects::project_detail(&stores, &admin, project_id).await.is_ok());
    let err = board::get_board(&stores, &admin, project_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    projects::delete_project(&stores, &admin, project_id).await.unwrap();

    let err = board::get_board(&stores, &a, project_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_validation_precedes_lookup() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;

    // Unknown project, but the blank title is reported first
    let err = board::create_task(&stores, &a, Uuid::new_v4(), titled("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = board::add_comment(&stores, &a, Uuid::new_v4(), Uuid::new_v4(), "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = board::create_task(&stores, &a, Uuid::new_v4(), titled("Real"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_assignee_normalization() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;

    for marker in ["", "null", "none", "unassigned"] {
        let task = board::create_task(
            &stores,
            &a,
            project_id,
            TaskInput {
                title: format!("Task {}", marker),
                assigned_to: Some(marker.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(task.assigned_to.is_none(), "marker {:?}", marker);
    }

    let err = board::create_task(
        &stores,
        &a,
        project_id,
        TaskInput {
            title: "Ghost".to_string(),
            assigned_to: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_update_task_is_partial() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;

    let task = board::create_task(
        &stores,
        &a,
        project_id,
        TaskInput {
            title: "Draft".to_string(),
            description: Some("First pass".to_string()),
            assigned_to: Some(a.user_id.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Only the priority changes
    let updated = board::update_task(
        &stores,
        &a,
        project_id,
        task.id,
        TaskPatch {
            priority: Some(TaskPriority::Critical),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "Draft");
    assert_eq!(updated.description.as_deref(), Some("First pass"));
    assert_eq!(updated.priority, TaskPriority::Critical);
    assert!(updated.assigned_to.as_ref().is_some_and(|r| r.refers_to(a.user_id)));
    assert_eq!(updated.status, "todo");

    // Explicit nulls clear nullable fields
    let cleared = board::update_task(
        &stores,
        &a,
        project_id,
        task.id,
        TaskPatch {
            description: Some(None),
            assigned_to: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.description, None);
    assert!(cleared.assigned_to.is_none());
    assert_eq!(cleared.priority, TaskPriority::Critical);

    let err = board::update_task(
        &stores,
        &a,
        project_id,
        task.id,
        TaskPatch {
            title: Some("".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_move_task_strictness() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;
    let task = board::create_task(&stores, &a, project_id, titled("Loose"))
        .await
        .unwrap();

    let moved = board::move_task(&stores, &a, project_id, task.id, "someday", false)
        .await
        .unwrap();
    assert_eq!(moved.status, "someday");

    let err = board::move_task(&stores, &a, project_id, task.id, "someday", true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let moved = board::move_task(&stores, &a, project_id, task.id, "in-progress", true)
        .await
        .unwrap();
    assert_eq!(moved.status, "in-progress");

    let err = board::move_task(&stores, &a, project_id, Uuid::new_v4(), "done", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_tasks_are_scoped_to_their_project() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let first = create_launch(&stores, &a).await;
    let second = create_launch(&stores, &a).await;

    let task = board::create_task(&stores, &a, first, titled("Mine"))
        .await
        .unwrap();

    let err = board::delete_task(&stores, &a, second, task.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = board::add_comment(&stores, &a, second, task.id, "Wrong board")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    board::delete_task(&stores, &a, first, task.id).await.unwrap();
    let err = board::delete_task(&stores, &a, first, task.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_comment_author_can_delete() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;
    let task = board::create_task(&stores, &a, project_id, titled("Review"))
        .await
        .unwrap();

    let task = board::add_comment(&stores, &a, project_id, task.id, "First")
        .await
        .unwrap();
    let task = board::add_comment(&stores, &a, project_id, task.id, "Second")
        .await
        .unwrap();
    let texts: Vec<&str> = task.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["First", "Second"]);

    let first_id = task.comments[0].id;
    let task = board::delete_comment(&stores, &a, project_id, task.id, first_id)
        .await
        .unwrap();
    assert_eq!(task.comments.len(), 1);
    assert_eq!(task.comments[0].text, "Second");

    let err = board::delete_comment(&stores, &a, project_id, task.id, first_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_project_admin_can_kick_but_not_add() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    let b = create_user(&stores, "Bob", UserRole::Member).await;
    let c = create_user(&stores, "Cy", UserRole::Member).await;
    let d = create_user(&stores, "Dee", UserRole::Member).await;
    let project_id = create_launch(&stores, &a).await;

    stores
        .projects
        .add_member(project_id, b.user_id, ProjectRole::Admin)
        .await
        .unwrap();
    projects::add_member_direct(&stores, &a, project_id, c.user_id)
        .await
        .unwrap();

    assert!(projects::generate_invite(&stores, &b, project_id).await.is_ok());

    let err = projects::add_member_direct(&stores, &b, project_id, d.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = projects::kick_member(&stores, &b, project_id, a.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let project = projects::kick_member(&stores, &b, project_id, c.user_id)
        .await
        .unwrap();
    assert!(!project.involves(c.user_id));
}

#[tokio::test]
async fn test_search_users_excludes_requester() {
    let stores = Stores::in_memory();
    let a = create_user(&stores, "Ada", UserRole::Member).await;
    create_user(&stores, "Adam", UserRole::Member).await;
    create_user(&stores, "Bob", UserRole::Member).await;

    let found = projects::search_users(&stores, &a, "ada").await.unwrap();
    let names: Vec<&str> = found.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Adam"]);

    let everyone = projects::search_users(&stores, &a, "").await.unwrap();
    assert_eq!(everyone.len(), 2);
}
