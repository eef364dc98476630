use crate::error::{Result, ZoneError};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// A single inclusion or exclusion criterion of a [`Zone`]
#[derive(Debug, Clone)]
pub enum Criterion {
    /// Literal prefix matched against the call-site identifier
    Prefix(String),
    /// Another zone whose membership is reused
    Zone(Zone),
}

impl From<&str> for Criterion {
    fn from(prefix: &str) -> Self {
        Criterion::Prefix(prefix.to_string())
    }
}

impl From<String> for Criterion {
    fn from(prefix: String) -> Self {
        Criterion::Prefix(prefix)
    }
}

impl From<Zone> for Criterion {
    fn from(zone: Zone) -> Self {
        Criterion::Zone(zone)
    }
}

impl From<&Zone> for Criterion {
    fn from(zone: &Zone) -> Self {
        Criterion::Zone(zone.clone())
    }
}

/// Prefixes and nested zones of one side (inclusion or exclusion) of a zone
#[derive(Default)]
struct Criteria {
    prefixes: Vec<String>,
    zones: Vec<Zone>,
}

impl Criteria {
    fn from_parts<I, C>(parts: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Criterion>,
    {
        let mut criteria = Criteria::default();
        for part in parts {
            match part.into() {
                Criterion::Prefix(prefix) => criteria.prefixes.push(prefix),
                Criterion::Zone(zone) => criteria.zones.push(zone),
            }
        }
        criteria
    }

    fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.zones.is_empty()
    }

    /// True if a prefix matches or any nested zone includes the identifier
    fn matches(&self, identifier: &str, covered: &mut Covered) -> Result<bool> {
        if self
            .prefixes
            .iter()
            .any(|prefix| identifier.starts_with(prefix.as_str()))
        {
            return Ok(true);
        }
        for zone in &self.zones {
            if zone.includes_covered(identifier, covered)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Identities of every zone visited while resolving one identifier
///
/// Zones are never removed once added, so reaching a zone a second time
/// through another branch fails just like a direct loop.
type Covered = HashSet<usize>;

struct ZoneInner {
    name: String,
    inclusion: RwLock<Criteria>,
    exclusion: RwLock<Criteria>,
}

/// A named code zone: a membership predicate over call-site identifiers
///
/// Zones are shared handles. Cloning a zone yields another handle to the same
/// definition, which is what lets zones nest (and, by mistake, form cycles).
/// Configure a zone with [`Zone::set_inclusion`] and [`Zone::set_exclusion`]
/// before handing it to other threads; afterwards it is only read.
///
/// # Example
/// ```
/// use zonetrace::zone::Zone;
///
/// let app = Zone::new("APP");
/// app.set_inclusion(["com.example"]).set_exclusion(["com.example.test"]);
///
/// assert!(app.includes("com.example.Service").unwrap());
/// assert!(!app.includes("com.example.test.ServiceTest").unwrap());
/// ```
#[derive(Clone)]
pub struct Zone {
    inner: Arc<ZoneInner>,
}

impl Zone {
    /// Create a zone with no criteria (includes everything, excludes nothing)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ZoneInner {
                name: name.into(),
                inclusion: RwLock::new(Criteria::default()),
                exclusion: RwLock::new(Criteria::default()),
            }),
        }
    }

    /// Display label of the zone
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Replace the inclusion criteria
    pub fn set_inclusion<I, C>(&self, parts: I) -> &Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Criterion>,
    {
        let criteria = Criteria::from_parts(parts);
        *self
            .inner
            .inclusion
            .write()
            .unwrap_or_else(PoisonError::into_inner) = criteria;
        self
    }

    /// Replace the exclusion criteria
    pub fn set_exclusion<I, C>(&self, parts: I) -> &Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Criterion>,
    {
        let criteria = Criteria::from_parts(parts);
        *self
            .inner
            .exclusion
            .write()
            .unwrap_or_else(PoisonError::into_inner) = criteria;
        self
    }

    /// Literal inclusion prefixes
    pub fn include_prefixes(&self) -> Vec<String> {
        self.inclusion().prefixes.clone()
    }

    /// Literal exclusion prefixes
    pub fn exclude_prefixes(&self) -> Vec<String> {
        self.exclusion().prefixes.clone()
    }

    /// Names of the zones nested as inclusion criteria
    pub fn include_zone_names(&self) -> Vec<String> {
        self.inclusion()
            .zones
            .iter()
            .map(|zone| zone.name().to_string())
            .collect()
    }

    /// Names of the zones nested as exclusion criteria
    pub fn exclude_zone_names(&self) -> Vec<String> {
        self.exclusion()
            .zones
            .iter()
            .map(|zone| zone.name().to_string())
            .collect()
    }

    /// Check whether a call-site identifier is a member of this zone
    ///
    /// # Errors
    /// Returns [`ZoneError::Cycle`] when resolution reaches a zone it has
    /// already visited for this identifier, whether through a loop or a
    /// second branch. That is a configuration bug and must not be read as
    /// "not a member".
    pub fn includes(&self, identifier: &str) -> Result<bool> {
        let mut covered = Covered::new();
        self.includes_covered(identifier, &mut covered)
    }

    /// Same handle (not merely equal definitions)
    pub fn same_zone(&self, other: &Zone) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn includes_covered(&self, identifier: &str, covered: &mut Covered) -> Result<bool> {
        if !covered.insert(self.identity()) {
            return Err(ZoneError::Cycle {
                zone: self.to_string(),
            });
        }

        if !self.check_included(identifier, covered)? {
            return Ok(false);
        }
        Ok(!self.check_excluded(identifier, covered)?)
    }

    fn check_included(&self, identifier: &str, covered: &mut Covered) -> Result<bool> {
        let inclusion = self.inclusion();
        // Empty inclusion list includes everyone
        if inclusion.is_empty() {
            return Ok(true);
        }
        inclusion.matches(identifier, covered)
    }

    fn check_excluded(&self, identifier: &str, covered: &mut Covered) -> Result<bool> {
        let exclusion = self.exclusion();
        // Empty exclusion list excludes no one
        if exclusion.is_empty() {
            return Ok(false);
        }
        exclusion.matches(identifier, covered)
    }

    fn inclusion(&self) -> RwLockReadGuard<'_, Criteria> {
        self.inner
            .inclusion
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusion(&self) -> RwLockReadGuard<'_, Criteria> {
        self.inner
            .exclusion
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Zones compare by their literal prefix lists only.
///
/// Nested zone references are not part of equality, so two zones built purely
/// from nested zones always compare equal.
impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        if self.same_zone(other) {
            return true;
        }
        self.inclusion().prefixes == other.inclusion().prefixes
            && self.exclusion().prefixes == other.exclusion().prefixes
    }
}

impl Eq for Zone {}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ZONE:{} IN:{:?} EX:{:?}",
            self.name(),
            self.inclusion().prefixes,
            self.exclusion().prefixes
        )
    }
}

// Nested zones print by name only; a full dump would recurse forever on a cycle.
impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("name", &self.name())
            .field("include_prefixes", &self.inclusion().prefixes)
            .field("include_zones", &self.include_zone_names())
            .field("exclude_prefixes", &self.exclusion().prefixes)
            .field("exclude_zones", &self.exclude_zone_names())
            .finish()
    }
}
