//! Call-stack zone analysis
//!
//! Walks a captured stack from the oldest call to the most recent one and
//! records where execution entered code zones, and where it left all of them.
//!
//! # Algorithm
//!
//! State carried across the walk: the zones active after the previous frame,
//! and the previous frame itself (the invoker of the current one).
//!
//! For every frame, plus one final virtual step past the most recent frame:
//! 1. Candidates = zones that include the frame's identifier (none for the
//!    virtual step)
//! 2. Active zones but no candidates: emit a full-exit transition and clear
//!    the active zones
//! 3. Active zones still among the candidates continue (removed from the
//!    candidates); the others are dropped without an event
//! 4. Remaining candidates are newly entered: emit an entry transition and
//!    make them active
//!
//! Synthetic accessor frames are skipped entirely and never become invokers.

use crate::analysis::{Analysis, Transition};
use crate::error::Result;
use crate::frame::Frame;
use crate::zone::Zone;

/// Analyze a captured stack against a set of code zones
///
/// `stack` is in capture order: most recent call first, as stack traces are
/// usually printed.
///
/// Returns `Ok(None)` when there is no stack or no zones: nothing to analyze.
///
/// # Errors
/// Propagates [`crate::error::ZoneError::Cycle`] from zone resolution. No
/// partial analysis is returned.
///
/// # Example
/// ```
/// use zonetrace::{analyzer, frame::Frame, zone::Zone};
///
/// let inner = Zone::new("INNER");
/// inner.set_inclusion(["pkg.inner"]);
///
/// let stack = vec![
///     Frame::new("pkg.inner.Worker", "helper").with_line(30),
///     Frame::new("pkg.inner.Worker", "doWork").with_line(20),
///     Frame::new("outer.Caller", "run").with_line(10),
/// ];
///
/// let analysis = analyzer::process(Some(&stack[..]), &[inner]).unwrap().unwrap();
/// assert_eq!(
///     analysis.render_all(),
///     vec!["[Caller#run(10)]-->[INNER]Worker#doWork", "[Worker#helper(30)]--><bottom>"]
/// );
/// ```
pub fn process(stack: Option<&[Frame]>, zones: &[Zone]) -> Result<Option<Analysis>> {
    let Some(stack) = stack else {
        return Ok(None);
    };
    if zones.is_empty() {
        return Ok(None);
    }

    let zones = distinct_zones(zones);
    let mut active: Vec<Zone> = Vec::new();
    let mut invoker: Option<&Frame> = None;
    let mut transitions = Vec::new();

    let steps = stack
        .iter()
        .rev()
        .filter(|frame| {
            if frame.is_synthetic_accessor() {
                tracing::trace!("Skipping synthetic accessor frame {}", frame);
                return false;
            }
            true
        })
        .map(Some)
        .chain(std::iter::once(None));

    for invoked in steps {
        let mut candidates = match invoked {
            Some(frame) => zones_including(&zones, frame)?,
            None => Vec::new(),
        };

        // Left every tracked zone
        if !active.is_empty() && candidates.is_empty() {
            let exit = Transition::new(invoker.cloned(), invoked.cloned(), Vec::new());
            tracing::debug!("Zone exit: {}", exit);
            transitions.push(exit);
            active.clear();
        }

        // Continuing zones are not re-entered; zones no longer matching drop out silently
        active.retain(|zone| match candidates.iter().position(|candidate| candidate == zone) {
            Some(index) => {
                candidates.remove(index);
                true
            }
            None => false,
        });

        if !candidates.is_empty() {
            let entry = Transition::new(invoker.cloned(), invoked.cloned(), candidates.clone());
            tracing::debug!("Zone entry: {}", entry);
            transitions.push(entry);
            active.extend(candidates);
        }

        invoker = invoked;
    }

    Ok(Some(Analysis::new(transitions)))
}

/// Zones in input order, each handle once
fn distinct_zones(zones: &[Zone]) -> Vec<&Zone> {
    let mut distinct: Vec<&Zone> = Vec::with_capacity(zones.len());
    for zone in zones {
        if !distinct.iter().any(|seen| seen.same_zone(zone)) {
            distinct.push(zone);
        }
    }
    distinct
}

fn zones_including(zones: &[&Zone], frame: &Frame) -> Result<Vec<Zone>> {
    let mut including = Vec::new();
    for zone in zones {
        if zone.includes(frame.identifier())? {
            including.push((*zone).clone());
        }
    }
    Ok(including)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZoneError;

    fn zone(name: &str, include: &[&str]) -> Zone {
        let zone = Zone::new(name);
        zone.set_inclusion(include.iter().copied());
        zone
    }

    /// Builds a capture-order stack (most recent first) from a chronological call list
    fn stack(chronological: &[(&str, &str, u32)]) -> Vec<Frame> {
        chronological
            .iter()
            .rev()
            .map(|(class, method, line)| Frame::new(*class, *method).with_line(*line))
            .collect()
    }

    #[test]
    fn test_absent_stack_is_not_an_error() {
        let zones = [zone("Z", &["a"])];
        assert_eq!(process(None, &zones), Ok(None));
    }

    #[test]
    fn test_empty_zone_set_is_not_an_error() {
        let frames = stack(&[("a.B", "c", 1)]);
        assert_eq!(process(Some(&frames[..]), &[]), Ok(None));
    }

    #[test]
    fn test_empty_stack_yields_empty_analysis() {
        let zones = [zone("Z", &["a"])];
        let analysis = process(Some(&[]), &zones).unwrap().unwrap();
        assert!(analysis.is_empty());
    }

    #[test]
    fn test_single_zone_entry_and_exit() {
        let z = zone("Z", &["pkg.inner"]);
        let frames = stack(&[
            ("outer.Caller", "run", 10),
            ("pkg.inner.Worker", "doWork", 20),
            ("pkg.inner.Worker", "helper", 30),
        ]);

        let analysis = process(Some(&frames[..]), &[z.clone()]).unwrap().unwrap();
        assert_eq!(analysis.len(), 2);

        let entry = &analysis.transitions()[0];
        assert_eq!(entry.invoker.as_ref().unwrap().method_name, "run");
        assert_eq!(entry.invoked.as_ref().unwrap().method_name, "doWork");
        assert_eq!(entry.entered_zones.len(), 1);
        assert!(entry.entered_zones[0].same_zone(&z));

        let exit = &analysis.transitions()[1];
        assert!(exit.is_exit());
        assert_eq!(exit.invoker.as_ref().unwrap().method_name, "helper");
        assert!(exit.invoked.is_none());

        assert_eq!(analysis.entry_point(&z), Some(entry));
        assert_eq!(analysis.exit_point(), Some(exit));
    }

    #[test]
    fn test_zone_entered_at_bottom_of_stack() {
        let z = zone("Z", &["app"]);
        let frames = stack(&[("app.Main", "main", 1), ("lib.Util", "work", 2)]);

        let analysis = process(Some(&frames[..]), &[z]).unwrap().unwrap();
        assert_eq!(
            analysis.render_all(),
            vec!["[<top>]-->[Z]Main#main", "[Main#main(1)]-->Util#work"]
        );
    }

    #[test]
    fn test_reentry_after_exit() {
        let z = zone("Z", &["app"]);
        let frames = stack(&[
            ("app.A", "a", 1),
            ("lib.L", "l", 2),
            ("app.B", "b", 3),
        ]);

        let analysis = process(Some(&frames[..]), &[z]).unwrap().unwrap();
        assert_eq!(
            analysis.render_all(),
            vec![
                "[<top>]-->[Z]A#a",
                "[A#a(1)]-->L#l",
                "[L#l(2)]-->[Z]B#b",
                "[B#b(3)]--><bottom>",
            ]
        );
    }

    #[test]
    fn test_partial_exit_is_silent() {
        let framework = zone("SUITAF", &["com.vmware.suitaf"]);
        let apl = zone("APL", &["com.vmware.suitaf.apl"]);
        let frames = stack(&[
            ("test.MyTest", "run", 1),
            ("com.vmware.suitaf.Tool", "click", 2),
            ("com.vmware.suitaf.apl.Link", "press", 3),
            ("com.vmware.suitaf.Tool", "verify", 4),
        ]);

        let analysis = process(Some(&frames[..]), &[framework.clone(), apl.clone()])
            .unwrap()
            .unwrap();

        // Leaving APL while staying in SUITAF emits nothing
        assert_eq!(
            analysis.render_all(),
            vec![
                "[MyTest#run(1)]-->[SUITAF]Tool#click",
                "[Tool#click(2)]-->[APL]Link#press",
                "[Tool#verify(4)]--><bottom>",
            ]
        );
        assert_eq!(analysis.entry_index(&apl), Some(1));
        assert_eq!(analysis.entry_index(&framework), Some(0));
    }

    #[test]
    fn test_silently_dropped_zone_can_be_entered_again() {
        let framework = zone("SUITAF", &["com.vmware.suitaf"]);
        let apl = zone("APL", &["com.vmware.suitaf.apl"]);
        let frames = stack(&[
            ("com.vmware.suitaf.apl.Link", "press", 1),
            ("com.vmware.suitaf.Tool", "verify", 2),
            ("com.vmware.suitaf.apl.Link", "release", 3),
        ]);

        let analysis = process(Some(&frames[..]), &[framework, apl]).unwrap().unwrap();
        assert_eq!(
            analysis.render_all(),
            vec![
                "[<top>]-->[SUITAF/APL]Link#press",
                "[Tool#verify(2)]-->[APL]Link#release",
                "[Link#release(3)]--><bottom>",
            ]
        );
    }

    #[test]
    fn test_switch_between_disjoint_zones_has_no_exit() {
        let left = zone("LEFT", &["left"]);
        let right = zone("RIGHT", &["right"]);
        let frames = stack(&[("left.A", "a", 1), ("right.B", "b", 2)]);

        let analysis = process(Some(&frames[..]), &[left, right]).unwrap().unwrap();
        assert_eq!(
            analysis.render_all(),
            vec!["[<top>]-->[LEFT]A#a", "[A#a(1)]-->[RIGHT]B#b", "[B#b(2)]--><bottom>"]
        );
    }

    #[test]
    fn test_equal_zones_read_as_one_zone_continuing() {
        // Nested-only zones have no prefixes, so A == B
        let a = Zone::new("A");
        a.set_inclusion([&zone("X", &["x."])]);
        let b = Zone::new("B");
        b.set_inclusion([&zone("Y", &["y."])]);
        assert_eq!(a, b);

        let frames = stack(&[("x.A", "a", 1), ("y.B", "b", 2)]);

        // Entering B matches the active A, so no transition is recorded
        let analysis = process(Some(&frames[..]), &[a, b]).unwrap().unwrap();
        assert_eq!(
            analysis.render_all(),
            vec!["[<top>]-->[A]A#a", "[B#b(2)]--><bottom>"]
        );
    }

    #[test]
    fn test_synthetic_accessor_frames_are_invisible() {
        let z = zone("Z", &["pkg.inner"]);
        let plain = stack(&[
            ("outer.Caller", "run", 10),
            ("pkg.inner.Worker", "doWork", 20),
            ("pkg.inner.Worker", "helper", 30),
        ]);
        let with_accessors = stack(&[
            ("outer.Caller", "access$000", 5),
            ("outer.Caller", "run", 10),
            ("pkg.inner.Worker", "access$100", 15),
            ("pkg.inner.Worker", "doWork", 20),
            ("pkg.inner.Worker", "helper", 30),
            ("pkg.inner.Worker", "access$200", 35),
        ]);

        let expected = process(Some(&plain[..]), &[z.clone()]).unwrap().unwrap();
        let actual = process(Some(&with_accessors[..]), &[z]).unwrap().unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.render_all(), expected.render_all());
    }

    #[test]
    fn test_duplicate_zone_handles_count_once() {
        let z = zone("Z", &["app"]);
        let frames = stack(&[("app.A", "a", 1)]);

        let analysis = process(Some(&frames[..]), &[z.clone(), z]).unwrap().unwrap();
        assert_eq!(analysis.render_all(), vec!["[<top>]-->[Z]A#a", "[A#a(1)]--><bottom>"]);
    }

    #[test]
    fn test_cycle_aborts_analysis() {
        let z1 = Zone::new("Z1");
        let z2 = Zone::new("Z2");
        z1.set_inclusion([&z2]);
        z2.set_inclusion([&z1]);
        let frames = stack(&[("a.B", "c", 1)]);

        assert!(matches!(
            process(Some(&frames[..]), &[z1]),
            Err(ZoneError::Cycle { .. })
        ));
    }

    #[test]
    fn test_no_zone_ever_entered() {
        let z = zone("Z", &["nowhere"]);
        let frames = stack(&[("a.B", "c", 1), ("d.E", "f", 2)]);

        let analysis = process(Some(&frames[..]), &[z]).unwrap().unwrap();
        assert!(analysis.is_empty());
        assert!(analysis.exit_point().is_none());
    }
}
