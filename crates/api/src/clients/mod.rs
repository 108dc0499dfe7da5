//! Clients for peer registry services.

mod directory;

pub use directory::{
    resolve_resident_refs, HttpRegionDirectory, HttpResidentDirectory, RegionDirectory,
    RegionSummary, ResidentDirectory, ResidentRecord, ResidentRef, ResidentSummary,
};
