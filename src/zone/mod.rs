// Code zones: named membership predicates over call-site identifiers.
//
// A zone is declared by literal identifier prefixes and by other zones, on
// both the inclusion and the exclusion side. Zones are usually declared in
// TOML and loaded through `ZoneRegistry`, or built in code with
// `Zone::set_inclusion` / `Zone::set_exclusion`.
//
// Membership of an identifier:
//   included = inclusion empty || prefix match || nested zone includes it
//   excluded = exclusion non-empty && (prefix match || nested zone includes it)
//   member   = included && !excluded
//
// Resolving one identifier visits each zone at most once. A zone reached a
// second time, through a loop or through another branch, is a configuration
// error (`ZoneError::Cycle`), never a plain `false`.

mod definition;
mod registry;

pub use definition::{Criterion, Zone};
pub use registry::{ZoneDefinition, ZoneRegistry};
