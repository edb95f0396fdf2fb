//! Per-tier library aggregation with first-claim tier exclusivity.

use crate::conflict::{resolve, VersionConflictError, VersionDrift};
use cartage_schema::{CartridgeDescriptor, CartridgeName, LibraryKey, Tier};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Requested versions of one library, each with the cartridges requesting it.
pub type ConflictGroup = BTreeMap<String, BTreeSet<CartridgeName>>;

/// Resolved library ids of one tier, before baseline exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierResolution {
    pub tier: Tier,
    pub libraries: BTreeSet<String>,
    pub drifts: Vec<VersionDrift>,
    /// Keys requested in this tier but already claimed by an earlier one.
    pub claimed_earlier: BTreeSet<LibraryKey>,
}

/// Union the declared libraries of every descriptor `tier` deploys, grouped by
/// `(group, name)` with every distinct version and its requesters.
pub fn aggregate<'a>(
    tier: Tier,
    descriptors: impl IntoIterator<Item = &'a CartridgeDescriptor>,
) -> BTreeMap<LibraryKey, ConflictGroup> {
    let mut groups: BTreeMap<LibraryKey, ConflictGroup> = BTreeMap::new();
    for descriptor in descriptors {
        if !descriptor.deployed_in(tier) {
            continue;
        }
        for lib in &descriptor.depends_on_libs {
            groups
                .entry(lib.key())
                .or_default()
                .entry(lib.version.clone())
                .or_default()
                .insert(descriptor.name.clone());
        }
    }
    groups
}

/// Resolve one tier. Keys in `claimed` are skipped; every key resolved here is
/// added to it.
pub fn resolve_tier(
    tier: Tier,
    descriptors: &[CartridgeDescriptor],
    claimed: &mut BTreeSet<LibraryKey>,
) -> Result<TierResolution, VersionConflictError> {
    let mut resolution = TierResolution {
        tier,
        libraries: BTreeSet::new(),
        drifts: Vec::new(),
        claimed_earlier: BTreeSet::new(),
    };
    let groups = aggregate(tier, descriptors);
    for (key, requests) in &groups {
        if claimed.contains(key) {
            resolution.claimed_earlier.insert(key.clone());
            continue;
        }
        let resolved = resolve(key, requests)?;
        resolution.libraries.insert(key.id(&resolved.version));
        resolution.drifts.extend(resolved.drifts);
    }
    claimed.extend(groups.into_keys());
    debug!(
        "{tier}: {} libraries, {} already claimed",
        resolution.libraries.len(),
        resolution.claimed_earlier.len()
    );
    Ok(resolution)
}

/// Fold over [`Tier::ORDERED`], threading the claimed-key set from each tier
/// into the next.
pub fn resolve_tiers(
    descriptors: &[CartridgeDescriptor],
) -> Result<Vec<TierResolution>, VersionConflictError> {
    let (_, resolutions) = Tier::ORDERED.iter().try_fold(
        (BTreeSet::new(), Vec::with_capacity(Tier::ORDERED.len())),
        |(mut claimed, mut acc), &tier| {
            acc.push(resolve_tier(tier, descriptors, &mut claimed)?);
            Ok::<_, VersionConflictError>((claimed, acc))
        },
    )?;
    Ok(resolutions)
}
