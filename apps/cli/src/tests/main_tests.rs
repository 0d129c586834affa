use super::*;
use shared::domain::{UserId, UserStatus};

fn user(role: UserRole) -> User {
    User {
        id: UserId::from("U1"),
        email: "ravi@example.com".into(),
        name: "Ravi".into(),
        role,
        status: UserStatus::Active,
    }
}

#[test]
fn admins_pass_the_user_admin_check() {
    let admin = ensure_can_manage_users(user(UserRole::Admin)).expect("admin");
    assert_eq!(admin.id, UserId::from("U1"));
}

#[test]
fn counselors_are_refused_user_admin() {
    let err = ensure_can_manage_users(user(UserRole::Counselor)).expect_err("counselor");
    assert_eq!(err.to_string(), "ravi@example.com is not allowed to manage users");
}

#[test]
fn lead_fields_convert_into_draft_without_followup() {
    let cli = Cli::parse_from([
        "crm", "leads", "create", "--name", "Meera", "--phone", "777", "--course", "Web Dev",
        "--city", "Nagpur", "--remark", "first visit",
    ]);
    let Command::Leads(LeadsCommand::Create(fields)) = cli.command else {
        panic!("expected leads create");
    };
    let draft = LeadDraft::from(fields);
    assert_eq!(draft.status, LeadStatus::New);
    assert_eq!(draft.source, "Web Search");
    assert_eq!(draft.next_followup_date, None);
}
