use crate::error::ZoneError;
use crate::zone::{Criterion, Zone};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// A zone as declared in TOML configuration
///
/// # Example TOML
/// ```toml
/// [[zone]]
/// name = "APL"
/// description = "Automation platform link"
/// include = ["com.vmware.suitaf.apl"]
///
/// [[zone]]
/// name = "SUITAF"
/// include = ["com.vmware.suitaf"]
/// exclude_zones = ["APL"]
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ZoneDefinition {
    /// Unique zone name (e.g., "APL", "SUITAF")
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Identifier prefixes that put a call site inside the zone
    #[serde(default)]
    pub include: Vec<String>,

    /// Names of zones whose members are also members of this zone
    #[serde(default)]
    pub include_zones: Vec<String>,

    /// Identifier prefixes that keep a call site out of the zone
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Names of zones whose members are kept out of this zone
    #[serde(default)]
    pub exclude_zones: Vec<String>,
}

#[derive(Deserialize)]
struct ZoneFile {
    #[serde(default)]
    zone: Vec<ZoneDefinition>,
}

/// Registry of named code zones loaded from TOML configuration
///
/// # Example Usage
/// ```no_run
/// use zonetrace::zone::ZoneRegistry;
///
/// let registry = ZoneRegistry::from_toml("zones.toml")?;
/// let apl = registry.get("APL").expect("APL zone is declared");
/// println!("{}", apl);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct ZoneRegistry {
    /// Zones in declaration order
    zones: Vec<Zone>,

    /// Declarations the zones were built from
    definitions: Vec<ZoneDefinition>,
}

impl ZoneRegistry {
    /// Load zone definitions from a TOML configuration file
    ///
    /// # Errors
    /// Returns error if the file doesn't exist, has invalid TOML syntax,
    /// declares a zone name twice, references an undeclared zone, or
    /// reaches one zone twice from another (a loop or a diamond).
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read zones file: {}", path.as_ref().display())
        })?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid zones file: {}", path.as_ref().display()))
    }

    /// Parse zone definitions from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ZoneFile =
            toml::from_str(content).context("Failed to parse TOML zone definitions")?;
        Self::from_definitions(file.zone)
    }

    /// Load the embedded zone pack describing the Rust runtime and test harness
    pub fn default_rust_zones() -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../../zones-default.toml");

        Self::from_toml_str(DEFAULT_TOML).context("Failed to parse embedded zones-default.toml")
    }

    /// Build zones from already parsed definitions
    ///
    /// Every zone is created first and wired afterwards, so definitions may
    /// reference zones declared later in the file.
    pub fn from_definitions(definitions: Vec<ZoneDefinition>) -> Result<Self> {
        let mut by_name: HashMap<&str, Zone> = HashMap::new();
        let mut zones = Vec::with_capacity(definitions.len());

        for definition in &definitions {
            let zone = Zone::new(definition.name.clone());
            if by_name.insert(definition.name.as_str(), zone.clone()).is_some() {
                return Err(ZoneError::DuplicateName(definition.name.clone()).into());
            }
            zones.push(zone);
        }

        check_references(&definitions)?;

        for (definition, zone) in definitions.iter().zip(&zones) {
            let resolve = |names: &[String]| -> Result<Vec<Criterion>> {
                names
                    .iter()
                    .map(|reference| {
                        by_name
                            .get(reference.as_str())
                            .map(Criterion::from)
                            .ok_or_else(|| {
                                anyhow::Error::from(ZoneError::UnknownReference {
                                    zone: definition.name.clone(),
                                    reference: reference.clone(),
                                })
                            })
                    })
                    .collect()
            };

            let mut inclusion: Vec<Criterion> = definition
                .include
                .iter()
                .cloned()
                .map(Criterion::from)
                .collect();
            inclusion.extend(resolve(&definition.include_zones)?);

            let mut exclusion: Vec<Criterion> = definition
                .exclude
                .iter()
                .cloned()
                .map(Criterion::from)
                .collect();
            exclusion.extend(resolve(&definition.exclude_zones)?);

            zone.set_inclusion(inclusion).set_exclusion(exclusion);
        }

        drop(by_name);
        tracing::debug!("Loaded {} zone definitions", zones.len());

        Ok(Self { zones, definitions })
    }

    /// Get zone by name
    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.name() == name)
    }

    /// Get all zones in declaration order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Get the declarations the zones were built from
    pub fn definitions(&self) -> &[ZoneDefinition] {
        &self.definitions
    }

    /// Pick zones by name, keeping the requested order
    ///
    /// # Errors
    /// Returns error if any name is not declared.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Zone>> {
        names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .cloned()
                    .with_context(|| format!("Unknown zone '{}'", name.as_ref()))
            })
            .collect()
    }
}

/// Reject references that membership resolution would trip over
///
/// Resolution visits every zone at most once per identifier, so a zone must
/// not be reachable twice from any declared zone: neither through a loop nor
/// through two branches. Unknown references are skipped here; wiring reports
/// them.
fn check_references(definitions: &[ZoneDefinition]) -> Result<()> {
    fn visit(
        index: usize,
        definitions: &[ZoneDefinition],
        index_of: &HashMap<&str, usize>,
        covered: &mut HashSet<usize>,
    ) -> std::result::Result<(), ZoneError> {
        if !covered.insert(index) {
            return Err(ZoneError::Cycle {
                zone: definitions[index].name.clone(),
            });
        }

        let definition = &definitions[index];
        for reference in definition
            .include_zones
            .iter()
            .chain(&definition.exclude_zones)
        {
            if let Some(&next) = index_of.get(reference.as_str()) {
                visit(next, definitions, index_of, covered)?;
            }
        }
        Ok(())
    }

    let index_of: HashMap<&str, usize> = definitions
        .iter()
        .enumerate()
        .map(|(index, definition)| (definition.name.as_str(), index))
        .collect();

    for index in 0..definitions.len() {
        let mut covered = HashSet::new();
        visit(index, definitions, &index_of, &mut covered)?;
    }
    Ok(())
}
