//! Units, capabilities and targets.
//!
//! Unit kinds form an open set: the well-known kinds are variants with built-in
//! capabilities, anything else is carried as [`UnitKind::Other`]. Capability
//! matching goes through the [`Capable`] trait so the planner never compares
//! kind strings itself.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::NodeId;

/// Capability a target may require from the unit assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Capability {
    SurfaceSampling,
    TerrainSurvey,
    AerialImaging,
    HighResolutionImaging,
    CommunicationRelay,
    Custom(String),
}

impl Capability {
    pub fn as_str(&self) -> &str {
        match self {
            Capability::SurfaceSampling => "surface_sampling",
            Capability::TerrainSurvey => "terrain_survey",
            Capability::AerialImaging => "aerial_imaging",
            Capability::HighResolutionImaging => "high_resolution_imaging",
            Capability::CommunicationRelay => "communication_relay",
            Capability::Custom(name) => name,
        }
    }
}

impl From<String> for Capability {
    fn from(value: String) -> Self {
        match normalize_tag(&value).as_str() {
            "surface_sampling" | "sampling" | "drilling" => Capability::SurfaceSampling,
            "terrain_survey" | "survey" | "ground_survey" => Capability::TerrainSurvey,
            "aerial_imaging" | "aerial_survey" | "imaging" => Capability::AerialImaging,
            "high_resolution_imaging" | "high_resolution_camera" | "hires_imaging" => {
                Capability::HighResolutionImaging
            }
            "communication_relay" | "relay" | "comms_relay" => Capability::CommunicationRelay,
            other => Capability::Custom(other.to_string()),
        }
    }
}

impl From<&str> for Capability {
    fn from(value: &str) -> Self {
        Capability::from(value.to_string())
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mobile unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnitKind {
    Rover,
    Drone,
    Satellite,
    Other(String),
}

impl UnitKind {
    pub fn as_str(&self) -> &str {
        match self {
            UnitKind::Rover => "rover",
            UnitKind::Drone => "drone",
            UnitKind::Satellite => "satellite",
            UnitKind::Other(name) => name,
        }
    }
}

impl From<String> for UnitKind {
    fn from(value: String) -> Self {
        match normalize_tag(&value).as_str() {
            "rover" | "ground" => UnitKind::Rover,
            "drone" | "aerial" | "uav" => UnitKind::Drone,
            "satellite" | "satelite" | "orbital" | "orbiter" => UnitKind::Satellite,
            other => UnitKind::Other(other.to_string()),
        }
    }
}

impl From<&str> for UnitKind {
    fn from(value: &str) -> Self {
        UnitKind::from(value.to_string())
    }
}

impl From<UnitKind> for String {
    fn from(value: UnitKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared capability-check contract for unit kinds and units.
pub trait Capable {
    /// Every capability offered.
    fn capabilities(&self) -> BTreeSet<Capability>;

    /// Whether the capability is offered.
    fn supports(&self, capability: &Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Whether a target with the given (optional) requirement may be served.
    fn satisfies(&self, required: Option<&Capability>) -> bool {
        required.map_or(true, |capability| self.supports(capability))
    }
}

impl Capable for UnitKind {
    fn capabilities(&self) -> BTreeSet<Capability> {
        let builtin: &[Capability] = match self {
            UnitKind::Rover => &[Capability::SurfaceSampling, Capability::TerrainSurvey],
            UnitKind::Drone => &[Capability::AerialImaging, Capability::TerrainSurvey],
            UnitKind::Satellite => &[
                Capability::HighResolutionImaging,
                Capability::CommunicationRelay,
            ],
            UnitKind::Other(_) => &[],
        };
        builtin.iter().cloned().collect()
    }
}

/// Operational limits of a unit. Every field is optional; an absent limit
/// does not constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintProfile {
    /// Maximum travel distance for a single sortie.
    #[serde(default, alias = "range", skip_serializing_if = "Option::is_none")]
    pub max_range: Option<f64>,
    /// Maximum energy the unit may spend on a sortie.
    #[serde(default, alias = "energy_budget", skip_serializing_if = "Option::is_none")]
    pub max_energy: Option<f64>,
    /// Energy currently available, in edge energy units.
    #[serde(
        default,
        alias = "battery",
        alias = "fuel",
        skip_serializing_if = "Option::is_none"
    )]
    pub charge: Option<f64>,
    /// Travel speed in distance units per time unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Maximum travel time; requires `speed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
}

impl ConstraintProfile {
    /// Effective energy budget: the tighter of `max_energy` and `charge`.
    pub fn energy_budget(&self) -> Option<f64> {
        match (self.max_energy, self.charge) {
            (Some(budget), Some(charge)) => Some(budget.min(charge)),
            (budget, charge) => budget.or(charge),
        }
    }

    /// Validate that limits are usable numbers.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let fields = [
            (self.max_range, "max_range"),
            (self.max_energy, "max_energy"),
            (self.charge, "charge"),
            (self.max_duration, "max_duration"),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(format!("{field} must be a finite non-negative number"));
                }
            }
        }

        match (self.speed, self.max_duration) {
            (Some(speed), _) if !speed.is_finite() || speed <= 0.0 => {
                Err("speed must be a finite positive number".to_string())
            }
            (None, Some(_)) => Err("max_duration requires speed".to_string()),
            _ => Ok(()),
        }
    }
}

/// Mobile unit available for assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: UnitKind,
    /// Start node; must exist in the graph for the unit to be plannable.
    #[serde(alias = "start", alias = "node")]
    pub location: NodeId,
    /// Capabilities declared in addition to those of the unit kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    #[serde(flatten)]
    pub profile: ConstraintProfile,
}

impl Unit {
    pub fn new(id: impl Into<String>, kind: UnitKind, location: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            kind,
            location: location.into(),
            capabilities: Vec::new(),
            profile: ConstraintProfile::default(),
        }
    }

    pub fn with_max_range(mut self, range: f64) -> Self {
        self.profile.max_range = Some(range);
        self
    }

    pub fn with_max_energy(mut self, budget: f64) -> Self {
        self.profile.max_energy = Some(budget);
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.profile.charge = Some(charge);
        self
    }

    pub fn with_time_budget(mut self, speed: f64, max_duration: f64) -> Self {
        self.profile.speed = Some(speed);
        self.profile.max_duration = Some(max_duration);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capabilities.push(capability.into());
        self
    }
}

impl Capable for Unit {
    fn capabilities(&self) -> BTreeSet<Capability> {
        let mut all = self.kind.capabilities();
        all.extend(self.capabilities.iter().cloned());
        all
    }
}

/// Scientific target node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub node: NodeId,
    /// Lower values are more important. Carried through to reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(
        default,
        alias = "required_capability",
        skip_serializing_if = "Option::is_none"
    )]
    pub capability: Option<Capability>,
}

impl Target {
    pub fn new(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            priority: None,
            capability: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn requiring(mut self, capability: impl Into<Capability>) -> Self {
        self.capability = Some(capability.into());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterDocument {
    Wrapped { units: Vec<Unit> },
    List(Vec<Unit>),
}

/// Parse a unit roster from JSON (a bare list or `{"units": [...]}`).
pub fn roster_from_json_str(json: &str) -> Result<Vec<Unit>> {
    let document: RosterDocument =
        serde_json::from_str(json).map_err(|err| Error::InvalidRoster {
            message: format!("unreadable roster document: {err}"),
        })?;
    let units = match document {
        RosterDocument::Wrapped { units } => units,
        RosterDocument::List(units) => units,
    };
    validate_roster(&units)?;
    Ok(units)
}

/// Parse a unit roster from CSV.
///
/// Header names are matched loosely (`type` for `kind`, `start` or `node` for
/// `location`, `range` for `max_range`). Capabilities are `;`-separated.
pub fn roster_from_csv_reader<R: Read>(reader: R) -> Result<Vec<Unit>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let normalized: Vec<String> = headers.iter().map(normalize_tag).collect();
    let synonyms: &[(&str, &[&str])] = &[
        ("id", &["id", "unit_id", "unit", "name"]),
        ("kind", &["kind", "type", "unit_type"]),
        ("location", &["location", "start", "node", "start_node"]),
        ("max_range", &["max_range", "range"]),
        ("max_energy", &["max_energy", "energy_budget"]),
        ("charge", &["charge", "battery", "fuel"]),
        ("speed", &["speed"]),
        ("max_duration", &["max_duration", "duration"]),
        ("capabilities", &["capabilities", "capability"]),
    ];
    let column = |canonical: &str| -> Option<usize> {
        let (_, alternatives) = synonyms.iter().find(|(name, _)| *name == canonical)?;
        alternatives
            .iter()
            .find_map(|alt| normalized.iter().position(|header| header == alt))
    };

    let missing: Vec<&str> = ["id", "kind", "location"]
        .into_iter()
        .filter(|name| column(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(Error::InvalidRoster {
            message: format!(
                "roster csv missing required columns: {}. Available: {}",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let mut units = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let text = |name: &str| -> Option<&str> {
            column(name)
                .and_then(|index| record.get(index))
                .filter(|value| !value.is_empty())
        };
        let number = |name: &str| -> Result<Option<f64>> {
            text(name)
                .map(|value| {
                    value.parse::<f64>().map_err(|_| Error::InvalidRoster {
                        message: format!("line {line}: {name} '{value}' is not a number"),
                    })
                })
                .transpose()
        };

        units.push(Unit {
            id: text("id").unwrap_or_default().to_string(),
            kind: UnitKind::from(text("kind").unwrap_or_default()),
            location: text("location").unwrap_or_default().to_string(),
            capabilities: text("capabilities")
                .map(|list| {
                    list.split(';')
                        .map(str::trim)
                        .filter(|cap| !cap.is_empty())
                        .map(Capability::from)
                        .collect()
                })
                .unwrap_or_default(),
            profile: ConstraintProfile {
                max_range: number("max_range")?,
                max_energy: number("max_energy")?,
                charge: number("charge")?,
                speed: number("speed")?,
                max_duration: number("max_duration")?,
            },
        });
    }

    validate_roster(&units)?;
    Ok(units)
}

/// Load a roster from a `.json` or `.csv` file.
pub fn load_roster(path: &Path) -> Result<Vec<Unit>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let units = if is_csv {
        roster_from_csv_reader(fs::File::open(path)?)?
    } else {
        roster_from_json_str(&fs::read_to_string(path)?)?
    };
    tracing::debug!(path = %path.display(), units = units.len(), "roster loaded");
    Ok(units)
}

fn validate_roster(units: &[Unit]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, unit) in units.iter().enumerate() {
        if unit.id.trim().is_empty() {
            return Err(Error::InvalidRoster {
                message: format!("unit #{index} has no id"),
            });
        }
        if !seen.insert(unit.id.as_str()) {
            return Err(Error::InvalidRoster {
                message: format!("duplicate unit id {}", unit.id),
            });
        }
        if unit.kind.as_str().is_empty() {
            return Err(Error::InvalidRoster {
                message: format!("unit {} has no kind", unit.id),
            });
        }
        if unit.location.trim().is_empty() {
            return Err(Error::InvalidRoster {
                message: format!("unit {} has no location", unit.id),
            });
        }
        unit.profile
            .validate()
            .map_err(|message| Error::InvalidRoster {
                message: format!("unit {}: {message}", unit.id),
            })?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Node(String),
    Record(Target),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetDocument {
    Wrapped { targets: Vec<TargetEntry> },
    List(Vec<TargetEntry>),
}

/// Parse a target list from JSON. Entries may be bare node ids or records.
pub fn targets_from_json_str(json: &str) -> Result<Vec<Target>> {
    let document: TargetDocument =
        serde_json::from_str(json).map_err(|err| Error::InvalidTargets {
            message: format!("unreadable target document: {err}"),
        })?;
    let entries = match document {
        TargetDocument::Wrapped { targets } => targets,
        TargetDocument::List(list) => list,
    };

    let targets: Vec<Target> = entries
        .into_iter()
        .map(|entry| match entry {
            TargetEntry::Node(node) => Target::new(node),
            TargetEntry::Record(target) => target,
        })
        .collect();

    let mut seen = HashSet::new();
    for (index, target) in targets.iter().enumerate() {
        if target.node.trim().is_empty() {
            return Err(Error::InvalidTargets {
                message: format!("target #{index} has no node"),
            });
        }
        if !seen.insert(target.node.as_str()) {
            return Err(Error::InvalidTargets {
                message: format!("duplicate target node {}", target.node),
            });
        }
    }
    Ok(targets)
}

/// Load a target list from a JSON file.
pub fn load_targets(path: &Path) -> Result<Vec<Target>> {
    targets_from_json_str(&fs::read_to_string(path)?)
}

fn normalize_tag(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
