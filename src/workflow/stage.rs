use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PaperError, PaperResult};

/// Lifecycle stage of a report, stored as the first segment of its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Draft,
    Submitted,
    Final,
    Sent,
}

/// Allowed moves between stages. `Draft -> Final` is the unreviewed
/// fallback and can be switched off per workflow.
pub const TRANSITIONS: [(Stage, Stage); 4] = [
    (Stage::Draft, Stage::Submitted),
    (Stage::Draft, Stage::Final),
    (Stage::Submitted, Stage::Final),
    (Stage::Final, Stage::Sent),
];

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Draft, Stage::Submitted, Stage::Final, Stage::Sent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Draft => "draft",
            Stage::Submitted => "submitted",
            Stage::Final => "final",
            Stage::Sent => "sent",
        }
    }

    /// Format of the artifact stored at this stage.
    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Stage::Draft | Stage::Submitted => ArtifactKind::Archive,
            Stage::Final | Stage::Sent => ArtifactKind::Pdf,
        }
    }

    pub fn can_transition_to(&self, to: Stage) -> bool {
        TRANSITIONS.contains(&(*self, to))
    }

    pub fn transition(&self, to: Stage) -> PaperResult<Stage> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(PaperError::InvalidTransition { from: *self, to })
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| PaperError::UnknownStage(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Zip of a scratch directory.
    Archive,
    Pdf,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Archive => "zip",
            ArtifactKind::Pdf => "pdf",
        }
    }
}

/// Remote location of one report at one stage:
/// `{stage}/{batch}/{name}.{zip|pdf}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub stage: Stage,
    pub batch: String,
    pub name: String,
}

impl ArtifactKey {
    pub fn new(stage: Stage, batch: &str, name: &str) -> Self {
        Self {
            stage,
            batch: batch.to_string(),
            name: name.to_string(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.stage.artifact_kind()
    }

    /// Same report at another stage.
    pub fn at(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }

    /// Prefix covering every report of `batch` at `stage`.
    pub fn batch_prefix(stage: Stage, batch: &str) -> String {
        format!("{stage}/{batch}/")
    }

    /// Inverse of `Display`. The batch may itself contain `/`.
    pub fn parse(key: &str) -> PaperResult<Self> {
        let invalid = || PaperError::InvalidArtifactKey(key.to_string());
        let (stage, rest) = key.split_once('/').ok_or_else(invalid)?;
        let stage: Stage = stage.parse().map_err(|_| invalid())?;
        let (batch, file) = rest.rsplit_once('/').ok_or_else(invalid)?;
        let name = file
            .strip_suffix(&format!(".{}", stage.artifact_kind().extension()))
            .ok_or_else(invalid)?;
        if batch.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(stage, batch, name))
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}.{}",
            self.stage,
            self.batch,
            self.name,
            self.kind().extension()
        )
    }
}
