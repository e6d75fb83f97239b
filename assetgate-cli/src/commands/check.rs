use std::path::Path;

use assetgate_core::config::AssetGateConfig;
use assetgate_core::rbac::{Role, RoleHierarchy};

use super::Outcome;

/// Parse a held role; "-" (or "none") means no role at all.
fn parse_held(held: &str) -> Result<Option<Role>, String> {
    match held {
        "-" | "none" => Ok(None),
        label => label.parse().map(Some).map_err(|e| format!("{}", e)),
    }
}

/// Evaluate `held` against `required` using the hierarchy from `config`.
pub fn run(held: &str, required: &str, config: &Path) -> Result<Outcome, String> {
    let held = parse_held(held)?;
    let required: Role = required.parse().map_err(|e| format!("{}", e))?;

    let config = AssetGateConfig::load_from(config).map_err(|e| format!("{:#}", e))?;
    let hierarchy = config.rbac.hierarchy().map_err(|e| format!("{:#}", e))?;

    Ok(evaluate(&hierarchy, held, required))
}

fn evaluate(hierarchy: &RoleHierarchy, held: Option<Role>, required: Role) -> Outcome {
    let granted = hierarchy.has_permission(held, required);
    let held_label = held.map(|role| role.to_string()).unwrap_or_else(|| "(none)".to_string());

    let output = format!(
        "{}: {} -> {}\n",
        if granted { "granted" } else { "denied" },
        held_label,
        required
    );
    Outcome { output, success: granted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_held_roles() {
        assert_eq!(parse_held("-").unwrap(), None);
        assert_eq!(parse_held("admin").unwrap(), Some(Role::Admin));
        assert!(parse_held("owner").is_err());
    }

    #[test]
    fn declared_hierarchy() {
        let hierarchy = RoleHierarchy::declared();

        let outcome = evaluate(&hierarchy, Some(Role::Admin), Role::Employee);
        assert!(outcome.success);
        assert_eq!(outcome.output, "granted: admin -> employee\n");

        let outcome = evaluate(&hierarchy, Some(Role::Employee), Role::Admin);
        assert!(!outcome.success);

        let outcome = evaluate(&hierarchy, None, Role::Employee);
        assert!(!outcome.success);
        assert!(outcome.output.contains("(none)"));
    }

    #[test]
    fn uses_configured_ranks() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("assetgate.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[rbac.ranks]\nemployee = 2\nadmin = 2").unwrap();

        let outcome = run("employee", "admin", &path).unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn rejects_unknown_required_role() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(run("admin", "owner", &tmp.path().join("absent.toml")).is_err());
    }
}
