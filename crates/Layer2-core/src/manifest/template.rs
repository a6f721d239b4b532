//! 새 스킬용 SKILL.md 템플릿

/// Manifest for a freshly created skill named `name`
pub fn generate_manifest(name: &str) -> String {
    format!(
        r#"---
name: {name}
description: Describe what this skill does and when to use it
---

# {name}

## Instructions

Step-by-step guidance for applying this skill.

## Examples

- Example request and the expected result
"#
    )
}
