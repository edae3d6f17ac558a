// Mixed-format merge: pair each MP record with the nearest MDG record within tolerance.

use crate::models::{MdgReadings, MpReadings};

/// A normalized but not yet sequenced record. `order` is the frame's byte offset.
#[derive(Debug, Clone)]
pub(super) struct Entry {
    pub rtd: i64,
    pub order: usize,
    pub mp: Option<MpReadings>,
    pub mdg: Option<MdgReadings>,
}

/// Greedy in MP rtd order: each MP entry takes the closest unconsumed MDG entry with
/// |dt| <= tolerance (ties go to the earlier MDG entry). Merged entries keep the MP rtd.
pub(super) fn merge(mut mp: Vec<Entry>, mut mdg: Vec<Entry>, tolerance_secs: i64) -> Vec<Entry> {
    mp.sort_by_key(|e| (e.rtd, e.order));
    mdg.sort_by_key(|e| (e.rtd, e.order));

    let mdg_rtd: Vec<i64> = mdg.iter().map(|e| e.rtd).collect();
    let mut mdg: Vec<Option<Entry>> = mdg.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(mp.len() + mdg.len());

    for mut entry in mp {
        let lo = entry.rtd.saturating_sub(tolerance_secs);
        let hi = entry.rtd.saturating_add(tolerance_secs);
        let start = mdg_rtd.partition_point(|&t| t < lo);

        let mut best: Option<(usize, i64)> = None;
        for (j, &t) in mdg_rtd.iter().enumerate().skip(start) {
            if t > hi {
                break;
            }
            if mdg[j].is_none() {
                continue;
            }
            let dist = (t - entry.rtd).abs();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((j, dist));
            }
        }

        if let Some((j, _)) = best
            && let Some(matched) = mdg[j].take()
        {
            entry.mdg = matched.mdg;
        }
        out.push(entry);
    }

    out.extend(mdg.into_iter().flatten());
    out
}
