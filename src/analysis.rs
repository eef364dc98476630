//! Zone transitions found along a call stack
//!
//! An [`Analysis`] is the chronological list of [`Transition`]s produced by
//! [`crate::analyzer::process`]. Each transition marks either the entry into
//! one or more zones, or (with no zones) the point where execution left every
//! tracked zone.

use crate::frame::Frame;
use crate::zone::Zone;
use std::fmt;

/// Boundary at which the set of active zones changed
#[derive(Debug, Clone)]
pub struct Transition {
    /// Frame that performed the call (`None` below the oldest observed frame)
    pub invoker: Option<Frame>,
    /// Frame that was called (`None` past the most recent observed frame)
    pub invoked: Option<Frame>,
    /// Zones entered here; empty for a full exit
    pub entered_zones: Vec<Zone>,
}

impl Transition {
    pub fn new(invoker: Option<Frame>, invoked: Option<Frame>, entered_zones: Vec<Zone>) -> Self {
        Self {
            invoker,
            invoked,
            entered_zones,
        }
    }

    /// `Short#method(line)` of the invoker, or `<top>`
    pub fn invoker_point(&self) -> String {
        self.invoker
            .as_ref()
            .map_or_else(|| "<top>".to_string(), Frame::invoker_label)
    }

    /// `Short#method` of the invoked frame, or `<bottom>`
    pub fn invoked_action(&self) -> String {
        self.invoked
            .as_ref()
            .map_or_else(|| "<bottom>".to_string(), Frame::invoked_label)
    }

    /// Entered zone names as `[A/B]`, or an empty string
    pub fn entered_zone_names(&self) -> String {
        if self.entered_zones.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = self.entered_zones.iter().map(Zone::name).collect();
        format!("[{}]", names.join("/"))
    }

    /// True when this transition leaves every tracked zone
    pub fn is_exit(&self) -> bool {
        self.entered_zones.is_empty()
    }

    /// Whether `zone` (by zone equality) is among the entered zones
    pub fn enters(&self, zone: &Zone) -> bool {
        self.entered_zones.contains(zone)
    }
}

/// Rendered as `[<invoker>]--><zones><invoked>`
impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]-->{}{}",
            self.invoker_point(),
            self.entered_zone_names(),
            self.invoked_action()
        )
    }
}

/// Transitions compare by their bounding frames only
impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.invoker == other.invoker && self.invoked == other.invoked
    }
}

/// Chronological sequence of zone transitions for one call stack
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    transitions: Vec<Transition>,
}

impl Analysis {
    pub fn new(transitions: Vec<Transition>) -> Self {
        Self { transitions }
    }

    /// All transitions, oldest first
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// First transition that entered `zone`
    ///
    /// Zone equality only looks at literal prefixes, so a different zone with
    /// the same prefix lists matches too.
    pub fn entry_point(&self, zone: &Zone) -> Option<&Transition> {
        self.transitions.iter().find(|transition| transition.enters(zone))
    }

    /// Index of [`Analysis::entry_point`] within [`Analysis::transitions`]
    pub fn entry_index(&self, zone: &Zone) -> Option<usize> {
        self.transitions
            .iter()
            .position(|transition| transition.enters(zone))
    }

    /// Last transition, entry or exit alike
    pub fn exit_point(&self) -> Option<&Transition> {
        self.transitions.last()
    }

    /// One rendered line per transition
    pub fn render_all(&self) -> Vec<String> {
        self.transitions.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Analysis {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, prefix: &str) -> Zone {
        let zone = Zone::new(name);
        zone.set_inclusion([prefix]);
        zone
    }

    #[test]
    fn test_render_entry_line() {
        let apl = zone("APL", "com.vmware.suitaf.apl");
        let transition = Transition::new(
            Some(Frame::new("com.vmware.suitaf.Tool", "click").with_line(12)),
            Some(Frame::new("com.vmware.suitaf.apl.Link", "press")),
            vec![apl],
        );
        assert_eq!(transition.to_string(), "[Tool#click(12)]-->[APL]Link#press");
    }

    #[test]
    fn test_render_multiple_zones() {
        let transition = Transition::new(
            None,
            Some(Frame::new("a.B", "c")),
            vec![zone("ONE", "a"), zone("TWO", "a.B")],
        );
        assert_eq!(transition.to_string(), "[<top>]-->[ONE/TWO]B#c");
    }

    #[test]
    fn test_render_exit_line() {
        let transition = Transition::new(Some(Frame::new("a.B", "c").with_line(9)), None, vec![]);
        assert!(transition.is_exit());
        assert_eq!(transition.to_string(), "[B#c(9)]--><bottom>");
    }

    #[test]
    fn test_transition_equality_ignores_zones() {
        let first = Transition::new(None, Some(Frame::new("a.B", "c")), vec![zone("Z", "a")]);
        let second = Transition::new(None, Some(Frame::new("a.B", "c")), vec![]);
        let third = Transition::new(None, Some(Frame::new("a.B", "d")), vec![]);

        assert_eq!(first, second);
        assert_ne!(first, third);
    }

    #[test]
    fn test_entry_and_exit_points() {
        let inner = zone("INNER", "pkg.inner");
        let outer = zone("OUTER", "pkg.outer");
        let entry = Transition::new(
            Some(Frame::new("outer.Caller", "run").with_line(1)),
            Some(Frame::new("pkg.inner.Worker", "doWork")),
            vec![inner.clone()],
        );
        let exit = Transition::new(
            Some(Frame::new("pkg.inner.Worker", "helper").with_line(2)),
            None,
            vec![],
        );
        let analysis = Analysis::new(vec![entry.clone(), exit.clone()]);

        assert_eq!(analysis.entry_point(&inner), Some(&entry));
        assert_eq!(analysis.entry_index(&inner), Some(0));
        assert_eq!(analysis.exit_point(), Some(&exit));
        assert!(analysis.entry_point(&outer).is_none());
    }

    #[test]
    fn test_entry_point_matches_equal_zone() {
        let registered = zone("REGISTERED", "pkg");
        let lookalike = zone("LOOKALIKE", "pkg");
        let analysis = Analysis::new(vec![Transition::new(
            None,
            Some(Frame::new("pkg.A", "b")),
            vec![registered],
        )]);

        assert!(analysis.entry_point(&lookalike).is_some());
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = Analysis::default();
        assert!(analysis.is_empty());
        assert!(analysis.exit_point().is_none());
        assert!(analysis.render_all().is_empty());
    }
}
