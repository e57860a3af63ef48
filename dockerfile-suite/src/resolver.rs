use log::debug;

use crate::models::{DistVersion, DistributionMap, Matcher};

/// Looks up the distribution a suite belongs to. The first matching entry
/// wins, in dist.yml order.
///
/// An exact match yields the suite name as the version. A pattern match
/// yields its first capture group, or the suite name when the pattern has no
/// group or the group is empty.
pub fn resolve(suite: &str, map: &DistributionMap) -> Option<DistVersion> {
    for (dist, matchers) in map.distributions.iter() {
        for matcher in matchers.iter() {
            let version = match matcher {
                Matcher::Exact(name) if name == suite => Some(suite.to_string()),
                Matcher::Exact(_) => None,
                Matcher::Pattern(regex) => regex.captures(suite).map(|captures| {
                    captures
                        .get(1)
                        .map(|group| group.as_str())
                        .filter(|group| !group.is_empty())
                        .unwrap_or(suite)
                        .to_string()
                }),
            };

            if let Some(version) = version {
                debug!("suite {} resolved to {} {}", suite, dist, version);
                return Some(DistVersion {
                    dist: dist.clone(),
                    version,
                });
            }
        }
    }

    None
}
