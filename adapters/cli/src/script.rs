//! Replay scripts: an ordered list of pointer events, arming requests and
//! server answers, written in TOML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use circles_core::{ActionKind, EntityId, HexCoord, StructureId, TargetId, UnitId};
use serde::Deserialize;

/// One scripted event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Pointer click on a hex or entity.
    Click(TargetId),
    /// Pointer enters a hex or entity.
    Hover(TargetId),
    /// Pointer leaves a hex or entity.
    Leave(TargetId),
    /// Player arms an action.
    Arm(ActionKind),
    /// The server answers the in-flight request with the JSON document.
    Respond(PathBuf),
}

/// Parsed replay script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Reads and parses the script; response files resolve next to it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script at {}", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&contents, &base)
    }

    /// Parses script contents, resolving response files against `base`.
    pub fn parse(contents: &str, base: &Path) -> Result<Self> {
        let raw: RawScript =
            toml::from_str(contents).context("failed to parse replay script toml contents")?;
        let steps = raw
            .step
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                step.resolve(base)
                    .with_context(|| format!("invalid replay step #{}", index + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    /// Steps in replay order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Response files in the order they are answered.
    pub fn responses(&self) -> impl Iterator<Item = &Path> {
        self.steps.iter().filter_map(|step| match step {
            Step::Respond(path) => Some(path.as_path()),
            _ => None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    step: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawStep {
    Click(RawTarget),
    Hover(RawTarget),
    Leave(RawTarget),
    Arm { action: String },
    Respond { file: PathBuf },
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    hex: Option<HexCoord>,
    unit: Option<u32>,
    structure: Option<u32>,
}

impl RawStep {
    fn resolve(self, base: &Path) -> Result<Step> {
        Ok(match self {
            Self::Click(target) => Step::Click(target.resolve()?),
            Self::Hover(target) => Step::Hover(target.resolve()?),
            Self::Leave(target) => Step::Leave(target.resolve()?),
            Self::Arm { action } => Step::Arm(action.parse()?),
            Self::Respond { file } => Step::Respond(base.join(file)),
        })
    }
}

impl RawTarget {
    fn resolve(self) -> Result<TargetId> {
        match (self.hex, self.unit, self.structure) {
            (Some(hex), None, None) => Ok(TargetId::Hex(hex)),
            (None, Some(unit), None) => Ok(TargetId::Entity(EntityId::Unit(UnitId::new(unit)))),
            (None, None, Some(structure)) => Ok(TargetId::Entity(EntityId::Structure(
                StructureId::new(structure),
            ))),
            _ => bail!("pointer steps need exactly one of `hex`, `unit` or `structure`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_kind_in_order() {
        let script = Script::parse(
            r#"
            [[step]]
            kind = "click"
            hex = "2;0"

            [[step]]
            kind = "hover"
            unit = 4

            [[step]]
            kind = "leave"
            structure = 1

            [[step]]
            kind = "arm"
            action = "path_of_fire"

            [[step]]
            kind = "respond"
            file = "answers/first.json"
            "#,
            Path::new("fixtures"),
        )
        .expect("script parses");

        assert_eq!(
            script.steps(),
            &[
                Step::Click(TargetId::Hex(HexCoord::new(2, 0))),
                Step::Hover(TargetId::Entity(EntityId::Unit(UnitId::new(4)))),
                Step::Leave(TargetId::Entity(EntityId::Structure(StructureId::new(1)))),
                Step::Arm(ActionKind::PathOfFire),
                Step::Respond(Path::new("fixtures").join("answers/first.json")),
            ]
        );
        assert_eq!(script.responses().count(), 1);
    }

    #[test]
    fn empty_script_has_no_steps() {
        let script = Script::parse("", Path::new(".")).expect("empty script parses");
        assert!(script.steps().is_empty());
    }

    #[test]
    fn ambiguous_pointer_target_is_rejected() {
        let error = Script::parse(
            r#"
            [[step]]
            kind = "click"
            hex = "0;0"
            unit = 3
            "#,
            Path::new("."),
        )
        .expect_err("two targets on one click");
        assert!(
            format!("{error:#}").contains("exactly one"),
            "unexpected error: {error:#}"
        );
    }

    #[test]
    fn unknown_action_names_are_rejected() {
        let error = Script::parse(
            r#"
            [[step]]
            kind = "arm"
            action = "fireball"
            "#,
            Path::new("."),
        )
        .expect_err("fireball is not in the catalog");
        assert!(format!("{error:#}").contains("fireball"));
    }
}
