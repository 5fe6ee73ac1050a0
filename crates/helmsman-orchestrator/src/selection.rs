// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate selection over the model catalog.
//!
//! Selection order: forced model > difficulty-range filter scored by
//! priority (with a specialty bonus) > global fallback to the most
//! preferred descriptor. Deprecated descriptors never participate.

use helmsman_core::ModelDescriptor;

/// Rank candidates for a query, best first.
///
/// - A forced model that exists in the catalog goes first; the ranked
///   list follows it so the retry loop can continue past a failure.
/// - Otherwise, non-deprecated descriptors whose difficulty range
///   contains `difficulty` are scored by `priority` (lower wins), minus
///   `specialty_bonus` when the descriptor carries the requested
///   specialty tag. Ties keep catalog order.
/// - If nothing matches the difficulty range, the globally most
///   preferred (lowest priority value) descriptor is the sole candidate.
pub fn rank_candidates<'a>(
    catalog: &'a [ModelDescriptor],
    difficulty: u8,
    specialty: Option<&str>,
    force_model: Option<&str>,
    specialty_bonus: u32,
) -> Vec<&'a ModelDescriptor> {
    let mut ranked = rank_by_difficulty(catalog, difficulty, specialty, specialty_bonus, false);

    if ranked.is_empty() {
        if let Some(fallback) = most_preferred(catalog, false) {
            ranked.push(fallback);
        }
    }

    if let Some(forced_id) = force_model {
        if let Some(forced) = catalog.iter().find(|d| d.id == forced_id) {
            ranked.retain(|d| d.id != forced.id);
            ranked.insert(0, forced);
        }
    }

    ranked
}

/// Rank the remote fallback tier: the same priority/difficulty rule
/// restricted to remote descriptors.
pub fn rank_remote_fallback<'a>(
    catalog: &'a [ModelDescriptor],
    difficulty: u8,
    specialty: Option<&str>,
    specialty_bonus: u32,
) -> Vec<&'a ModelDescriptor> {
    let mut ranked = rank_by_difficulty(catalog, difficulty, specialty, specialty_bonus, true);
    if ranked.is_empty() {
        if let Some(fallback) = most_preferred(catalog, true) {
            ranked.push(fallback);
        }
    }
    ranked
}

fn rank_by_difficulty<'a>(
    catalog: &'a [ModelDescriptor],
    difficulty: u8,
    specialty: Option<&str>,
    specialty_bonus: u32,
    remote_only: bool,
) -> Vec<&'a ModelDescriptor> {
    let mut scored: Vec<(i64, usize, &ModelDescriptor)> = catalog
        .iter()
        .enumerate()
        .filter(|(_, d)| !d.deprecated)
        .filter(|(_, d)| !remote_only || !d.is_local())
        .filter(|(_, d)| d.matches_difficulty(difficulty))
        .map(|(idx, d)| {
            let mut score = i64::from(d.priority);
            if let Some(tag) = specialty {
                if d.has_specialty(tag) {
                    score -= i64::from(specialty_bonus);
                }
            }
            (score, idx, d)
        })
        .collect();

    scored.sort_by_key(|(score, idx, _)| (*score, *idx));
    scored.into_iter().map(|(_, _, d)| d).collect()
}

/// The non-deprecated descriptor with the lowest priority value,
/// catalog order breaking ties.
fn most_preferred(catalog: &[ModelDescriptor], remote_only: bool) -> Option<&ModelDescriptor> {
    catalog
        .iter()
        .filter(|d| !d.deprecated)
        .filter(|d| !remote_only || !d.is_local())
        .min_by_key(|d| d.priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmsman_core::BackendKind;

    fn descriptor(
        id: &str,
        backend: BackendKind,
        range: (u8, u8),
        priority: u32,
        specialties: &[&str],
    ) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            backend,
            path_or_endpoint: String::new(),
            accelerator: backend.is_local().then_some(0),
            vram_required_mb: if backend.is_local() { 8000 } else { 0 },
            difficulty_range: range,
            quantization: None,
            max_context_tokens: 8192,
            default_temperature: 0.7,
            priority,
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            deprecated: false,
        }
    }

    /// Catalog from the routing scenario: A (1-40, prio 1),
    /// B (30-100, prio 2), remote R (1-100, prio 99).
    fn scenario_catalog() -> Vec<ModelDescriptor> {
        vec![
            descriptor("model-a", BackendKind::LocalVllm, (1, 40), 1, &[]),
            descriptor("model-b", BackendKind::LocalVllm, (30, 100), 2, &[]),
            descriptor("remote-r", BackendKind::RemoteApi, (1, 100), 99, &[]),
        ]
    }

    #[test]
    fn difficulty_35_prefers_a_then_b_then_r() {
        let catalog = scenario_catalog();
        let ranked = rank_candidates(&catalog, 35, None, None, 2);
        let ids: Vec<&str> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["model-a", "model-b", "remote-r"]);
    }

    #[test]
    fn difficulty_80_excludes_a() {
        let catalog = scenario_catalog();
        let ranked = rank_candidates(&catalog, 80, None, None, 2);
        let ids: Vec<&str> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["model-b", "remote-r"]);
    }

    #[test]
    fn specialty_bonus_reorders_candidates() {
        let catalog = vec![
            descriptor("generalist", BackendKind::LocalVllm, (1, 100), 1, &[]),
            descriptor("coder", BackendKind::LocalVllm, (1, 100), 2, &["code"]),
        ];
        // Without the tag, priority wins.
        let ids: Vec<&str> = rank_candidates(&catalog, 50, None, None, 2)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["generalist", "coder"]);

        // With it, the bonus beats the one-point priority gap.
        let ids: Vec<&str> = rank_candidates(&catalog, 50, Some("code"), None, 2)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["coder", "generalist"]);
    }

    #[test]
    fn deprecated_descriptors_never_selected() {
        let mut catalog = scenario_catalog();
        catalog[0].deprecated = true;
        let ranked = rank_candidates(&catalog, 35, None, None, 2);
        assert!(ranked.iter().all(|d| d.id != "model-a"));
    }

    #[test]
    fn no_difficulty_match_falls_back_to_most_preferred() {
        let catalog = vec![
            descriptor("narrow-a", BackendKind::LocalVllm, (1, 10), 5, &[]),
            descriptor("narrow-b", BackendKind::LocalVllm, (90, 100), 3, &[]),
        ];
        let ranked = rank_candidates(&catalog, 50, None, None, 2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "narrow-b");
    }

    #[test]
    fn forced_model_goes_first() {
        let catalog = scenario_catalog();
        let ranked = rank_candidates(&catalog, 35, None, Some("remote-r"), 2);
        let ids: Vec<&str> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["remote-r", "model-a", "model-b"]);
    }

    #[test]
    fn unknown_forced_model_is_ignored() {
        let catalog = scenario_catalog();
        let ranked = rank_candidates(&catalog, 35, None, Some("no-such-model"), 2);
        assert_eq!(ranked[0].id, "model-a");
    }

    #[test]
    fn remote_fallback_restricted_to_remotes() {
        let catalog = scenario_catalog();
        let ranked = rank_remote_fallback(&catalog, 35, None, 2);
        let ids: Vec<&str> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["remote-r"]);
    }

    #[test]
    fn remote_fallback_ignores_difficulty_when_nothing_matches() {
        let catalog = vec![
            descriptor("local", BackendKind::LocalVllm, (1, 100), 1, &[]),
            descriptor("remote-narrow", BackendKind::RemoteApi, (90, 100), 50, &[]),
        ];
        let ranked = rank_remote_fallback(&catalog, 20, None, 2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "remote-narrow");
    }

    #[test]
    fn priority_ties_keep_catalog_order() {
        let catalog = vec![
            descriptor("first", BackendKind::RemoteApi, (1, 100), 10, &[]),
            descriptor("second", BackendKind::RemoteApi, (1, 100), 10, &[]),
        ];
        let ranked = rank_candidates(&catalog, 50, None, None, 2);
        let ids: Vec<&str> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
