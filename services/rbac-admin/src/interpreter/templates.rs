//! Command templates.
//!
//! Each intent owns an ordered list of phrase shapes. A shape is a
//! case-insensitive pattern plus the capture slots holding the role and the
//! permission name. Intents are tried in [`TEMPLATES`] order and shapes in
//! declaration order; the first shape that matches decides the command.
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// What a command asks the store to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    CreatePermission,
    CreateRole,
    RemovePermission,
    AssignPermission,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::CreatePermission => "create_permission",
            Intent::CreateRole => "create_role",
            Intent::RemovePermission => "remove_permission",
            Intent::AssignPermission => "assign_permission",
        }
    }
}

/// A recognized command with its extracted entity names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    CreatePermission {
        name: String,
        description: Option<String>,
    },
    CreateRole {
        name: String,
    },
    RemovePermission {
        role: String,
        permission: String,
    },
    AssignPermission {
        role: String,
        permission: String,
    },
}

impl ParsedCommand {
    pub fn intent(&self) -> Intent {
        match self {
            ParsedCommand::CreatePermission { .. } => Intent::CreatePermission,
            ParsedCommand::CreateRole { .. } => Intent::CreateRole,
            ParsedCommand::RemovePermission { .. } => Intent::RemovePermission,
            ParsedCommand::AssignPermission { .. } => Intent::AssignPermission,
        }
    }
}

/// Which capture group carries which entity name.
#[derive(Debug, Clone, Copy)]
enum Slots {
    /// Group 1 is the name, optional group 2 the description.
    NameAndDescription,
    /// Group 1 is the name.
    Name,
    RoleThenPermission,
    PermissionThenRole,
}

struct PhraseShape {
    pattern: Regex,
    slots: Slots,
}

struct Template {
    intent: Intent,
    shapes: Vec<PhraseShape>,
}

/// A quoted entity name: single or double quotes, no quotes inside.
const QUOTED: &str = r#"['"]([^'"]+)['"]"#;
/// Filler between template tokens. It never crosses a quote, so keywords only
/// count outside quoted names.
const GAP: &str = r#"[^'"]*?"#;
const REMOVAL_VERB: &str = r"\b(?:remove|revoke|delete|take)";

fn token(word: &str) -> String {
    match word {
        "{Q}" => QUOTED.to_string(),
        "{V}" => REMOVAL_VERB.to_string(),
        "{D}" => format!(r"(?:{GAP}\bdescription{GAP}{QUOTED})?"),
        keyword => format!(r"\b{keyword}"),
    }
}

/// Build a shape from space-separated tokens: keywords, `{Q}` for a quoted
/// name, `{V}` for a removal verb and `{D}` for an optional quoted
/// description. The pattern is anchored so the text before the first token
/// cannot hide a quote either.
fn shape(template: &str, slots: Slots) -> PhraseShape {
    let mut source = format!("(?i)^{GAP}");
    for (index, word) in template.split_whitespace().enumerate() {
        if index > 0 && word != "{D}" {
            source.push_str(GAP);
        }
        source.push_str(&token(word));
    }
    PhraseShape {
        pattern: Regex::new(&source).expect("command template must compile"),
        slots,
    }
}

/// Intents in priority order. Removal is tried before assignment because the
/// assignment shapes also accept "... permission 'x' ... role 'y'" phrasing.
static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(|| {
    vec![
        Template {
            intent: Intent::CreatePermission,
            shapes: vec![shape("create permission {Q} {D}", Slots::NameAndDescription)],
        },
        Template {
            intent: Intent::CreateRole,
            shapes: vec![shape("create role {Q}", Slots::Name)],
        },
        Template {
            intent: Intent::RemovePermission,
            shapes: vec![
                shape("{V} permission {Q} role {Q}", Slots::PermissionThenRole),
                shape("role {Q} {V} permission {Q}", Slots::RoleThenPermission),
                shape("role {Q} permission {Q} {V}", Slots::RoleThenPermission),
            ],
        },
        Template {
            intent: Intent::AssignPermission,
            shapes: vec![
                shape("give role {Q} permission {Q}", Slots::RoleThenPermission),
                shape("assign permission {Q} role {Q}", Slots::PermissionThenRole),
                shape("add permission {Q} role {Q}", Slots::PermissionThenRole),
                shape("role {Q} permission {Q}", Slots::RoleThenPermission),
                shape("permission {Q} role {Q}", Slots::PermissionThenRole),
                shape("{Q} permission {Q}", Slots::RoleThenPermission),
                shape("{Q} role {Q} permission", Slots::RoleThenPermission),
            ],
        },
    ]
});

fn group(captures: &Captures<'_>, index: usize) -> Option<String> {
    captures.get(index).map(|m| m.as_str().to_string())
}

fn extract(intent: Intent, slots: Slots, captures: &Captures<'_>) -> Option<ParsedCommand> {
    let pair = |first: usize, second: usize| Some((group(captures, first)?, group(captures, second)?));
    let command = match (intent, slots) {
        (Intent::CreatePermission, Slots::NameAndDescription) => ParsedCommand::CreatePermission {
            name: group(captures, 1)?,
            description: group(captures, 2),
        },
        (Intent::CreateRole, Slots::Name) => ParsedCommand::CreateRole {
            name: group(captures, 1)?,
        },
        (Intent::RemovePermission | Intent::AssignPermission, Slots::RoleThenPermission) => {
            let (role, permission) = pair(1, 2)?;
            pair_command(intent, role, permission)
        }
        (Intent::RemovePermission | Intent::AssignPermission, Slots::PermissionThenRole) => {
            let (permission, role) = pair(1, 2)?;
            pair_command(intent, role, permission)
        }
        _ => return None,
    };
    Some(command)
}

fn pair_command(intent: Intent, role: String, permission: String) -> ParsedCommand {
    if intent == Intent::RemovePermission {
        ParsedCommand::RemovePermission { role, permission }
    } else {
        ParsedCommand::AssignPermission { role, permission }
    }
}

/// Match `text` against the templates; `None` when nothing applies.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    TEMPLATES.iter().find_map(|template| {
        template.shapes.iter().find_map(|shape| {
            let captures = shape.pattern.captures(text)?;
            extract(template.intent, shape.slots, &captures)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(role: &str, permission: &str) -> Option<ParsedCommand> {
        Some(ParsedCommand::AssignPermission {
            role: role.to_string(),
            permission: permission.to_string(),
        })
    }

    fn remove(role: &str, permission: &str) -> Option<ParsedCommand> {
        Some(ParsedCommand::RemovePermission {
            role: role.to_string(),
            permission: permission.to_string(),
        })
    }

    #[test]
    fn templates_compile() {
        assert_eq!(TEMPLATES.len(), 4);
        assert_eq!(
            TEMPLATES.iter().map(|t| t.shapes.len()).sum::<usize>(),
            1 + 1 + 3 + 7
        );
    }

    #[test]
    fn create_permission_takes_first_quote_as_name() {
        assert_eq!(
            parse_command(r#"create a new permission called "manage posts""#),
            Some(ParsedCommand::CreatePermission {
                name: "manage posts".to_string(),
                description: None,
            })
        );
        assert_eq!(
            parse_command(r#"create permission 'publish' with description 'Can publish posts'"#),
            Some(ParsedCommand::CreatePermission {
                name: "publish".to_string(),
                description: Some("Can publish posts".to_string()),
            })
        );
    }

    #[test]
    fn create_role_ignores_description() {
        assert_eq!(
            parse_command(r#"Create a role "Editor" with description "edits things""#),
            Some(ParsedCommand::CreateRole {
                name: "Editor".to_string(),
            })
        );
    }

    #[test]
    fn assignment_phrasings() {
        assert_eq!(
            parse_command(r#"give the role "editor" the permission to "edit articles""#),
            assign("editor", "edit articles")
        );
        assert_eq!(
            parse_command(r#"assign permission 'publish' to role 'author'"#),
            assign("author", "publish")
        );
        assert_eq!(
            parse_command(r#"add permission "read" to the role "viewer""#),
            assign("viewer", "read")
        );
        assert_eq!(
            parse_command(r#"the role "viewer" should get permission "read""#),
            assign("viewer", "read")
        );
        assert_eq!(
            parse_command(r#"permission "read" belongs to role "viewer""#),
            assign("viewer", "read")
        );
        assert_eq!(
            parse_command(r#""viewer" needs permission "read""#),
            assign("viewer", "read")
        );
        assert_eq!(
            parse_command(r#""viewer" is a role and "read" is its permission"#),
            assign("viewer", "read")
        );
    }

    #[test]
    fn removal_phrasings_win_over_assignment() {
        assert_eq!(
            parse_command(r#"remove the permission "delete posts" from role "editor""#),
            remove("editor", "delete posts")
        );
        assert_eq!(
            parse_command(r#"revoke permission 'publish' from role 'author'"#),
            remove("author", "publish")
        );
        assert_eq!(
            parse_command(r#"take permission "x" away from role "y""#),
            remove("y", "x")
        );
        assert_eq!(
            parse_command(r#"for role "editor", delete the permission "publish""#),
            remove("editor", "publish")
        );
        assert_eq!(
            parse_command(r#"role "editor" permission "publish" should be revoked"#),
            remove("editor", "publish")
        );
    }

    #[test]
    fn verbs_inside_names_do_not_trigger_removal() {
        assert_eq!(
            parse_command(r#"add permission "delete posts" to role "editor""#),
            assign("editor", "delete posts")
        );
    }

    #[test]
    fn create_keywords_inside_names_do_not_trigger_creation() {
        assert_eq!(
            parse_command(r#"assign permission "create users" to role "admin""#),
            assign("admin", "create users")
        );
        assert_eq!(
            parse_command(r#"remove permission "create users" from role "admin""#),
            remove("admin", "create users")
        );
        assert_eq!(
            parse_command(r#"add permission "create posts" to role "editor""#),
            assign("editor", "create posts")
        );
        assert_eq!(
            parse_command(r#"revoke permission "create role x" from role "ops""#),
            remove("ops", "create role x")
        );
        assert_eq!(
            parse_command(r#"give the role "create permission admins" the permission "read""#),
            assign("create permission admins", "read")
        );
    }

    #[test]
    fn keywords_must_start_a_word() {
        assert_eq!(
            parse_command(r#"recreate role "ops""#),
            None
        );
        assert_eq!(
            parse_command(r#"for role "editor", undelete permission "publish""#),
            assign("editor", "publish")
        );
        assert_eq!(
            parse_command(r#"role "editor" permission "publish" was removed"#),
            remove("editor", "publish")
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            parse_command(r#"REMOVE PERMISSION "Read" FROM ROLE "Viewer""#),
            remove("Viewer", "Read")
        );
    }

    #[test]
    fn unrelated_text_is_not_a_command() {
        assert_eq!(parse_command("what time is it"), None);
        assert_eq!(parse_command("create permission without quotes"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn intent_names_are_stable() {
        let parsed = parse_command(r#"create role "ops""#).expect("parsed");
        assert_eq!(parsed.intent(), Intent::CreateRole);
        assert_eq!(parsed.intent().as_str(), "create_role");
    }
}
