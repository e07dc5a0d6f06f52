//! Clustering of raw classifier hits into final detections.
//!
//! Hits are partitioned with union-find on a size-relative similarity
//! predicate, each cluster is averaged, and clusters supported by too few
//! hits (or nested inside a better supported one) are dropped.

use crate::shared::rect::Rect;

/// Find root of element `i` with path halving for amortized near-O(1).
fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Two hits belong together when every edge is within `eps` of the mean
/// of their smaller sides.
fn similar(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.right() - b.right()).abs() as f64 <= delta
        && (a.bottom() - b.bottom()).abs() as f64 <= delta
}

/// Groups raw hits. A cluster survives only with more than
/// `group_threshold` members; a threshold of 0 returns the hits unchanged.
pub fn group_rectangles(hits: &[Rect], group_threshold: u32, eps: f64) -> Vec<Rect> {
    if group_threshold == 0 || hits.is_empty() {
        return hits.to_vec();
    }

    let mut parent: Vec<usize> = (0..hits.len()).collect();
    for i in 0..hits.len() {
        for j in (i + 1)..hits.len() {
            if similar(&hits[i], &hits[j], eps) {
                union(&mut parent, i, j);
            }
        }
    }

    // root -> (sum x, sum y, sum w, sum h, count)
    let mut sums: Vec<(usize, [i64; 4], u32)> = Vec::new();
    for (i, hit) in hits.iter().enumerate() {
        let root = find(&mut parent, i);
        let slot = match sums.iter().position(|(r, _, _)| *r == root) {
            Some(pos) => pos,
            None => {
                sums.push((root, [0; 4], 0));
                sums.len() - 1
            }
        };
        let (_, acc, count) = &mut sums[slot];
        acc[0] += hit.x as i64;
        acc[1] += hit.y as i64;
        acc[2] += hit.width as i64;
        acc[3] += hit.height as i64;
        *count += 1;
    }

    let clusters: Vec<(Rect, u32)> = sums
        .iter()
        .map(|(_, acc, n)| {
            let avg = |v: i64| (v as f64 / *n as f64).round() as i32;
            (Rect::new(avg(acc[0]), avg(acc[1]), avg(acc[2]), avg(acc[3])), *n)
        })
        .collect();

    clusters
        .iter()
        .enumerate()
        .filter(|(_, (_, n1))| *n1 > group_threshold)
        .filter(|(i, (r1, n1))| {
            !clusters.iter().enumerate().any(|(j, (r2, n2))| {
                j != *i
                    && *n2 > group_threshold
                    && nested_in(r1, r2, eps)
                    && (*n2 > (*n1).max(3) || *n1 < 3)
            })
        })
        .map(|(_, (r, _))| *r)
        .collect()
}

fn nested_in(inner: &Rect, outer: &Rect, eps: f64) -> bool {
    let dx = (outer.width as f64 * eps).round() as i32;
    let dy = (outer.height as f64 * eps).round() as i32;
    inner.x >= outer.x - dx
        && inner.y >= outer.y - dy
        && inner.right() <= outer.right() + dx
        && inner.bottom() <= outer.bottom() + dy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::GROUP_EPS;

    #[test]
    fn test_threshold_zero_returns_hits_unchanged() {
        let hits = vec![Rect::new(0, 0, 10, 10), Rect::new(1, 1, 10, 10)];
        assert_eq!(group_rectangles(&hits, 0, GROUP_EPS), hits);
    }

    #[test]
    fn test_empty_hits() {
        assert!(group_rectangles(&[], 2, GROUP_EPS).is_empty());
    }

    #[test]
    fn test_cluster_is_averaged() {
        let hits = vec![
            Rect::new(10, 10, 20, 20),
            Rect::new(11, 10, 20, 20),
            Rect::new(12, 10, 20, 20),
        ];
        let grouped = group_rectangles(&hits, 2, GROUP_EPS);
        assert_eq!(grouped, vec![Rect::new(11, 10, 20, 20)]);
    }

    #[test]
    fn test_cluster_at_threshold_is_rejected() {
        let hits = vec![Rect::new(10, 10, 20, 20), Rect::new(11, 10, 20, 20)];
        assert!(group_rectangles(&hits, 2, GROUP_EPS).is_empty());
    }

    #[test]
    fn test_distant_hits_form_separate_clusters() {
        let mut hits = Vec::new();
        for d in 0..3 {
            hits.push(Rect::new(10 + d, 10, 20, 20));
            hits.push(Rect::new(100 + d, 100, 20, 20));
        }
        let grouped = group_rectangles(&hits, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 2);
        assert!(grouped.contains(&Rect::new(11, 10, 20, 20)));
        assert!(grouped.contains(&Rect::new(101, 100, 20, 20)));
    }

    #[test]
    fn test_weak_cluster_nested_in_strong_one_is_dropped() {
        let mut hits = Vec::new();
        for d in 0..6 {
            hits.push(Rect::new(d, 0, 100, 100));
        }
        for d in 0..3 {
            hits.push(Rect::new(40 + d, 40, 20, 20));
        }
        let grouped = group_rectangles(&hits, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].width, 100);
    }

    #[test]
    fn test_similarity_is_size_relative() {
        // delta = 0.2 * (20 + 20) / 2 = 4
        assert!(similar(&Rect::new(0, 0, 20, 20), &Rect::new(4, 0, 20, 20), GROUP_EPS));
        assert!(!similar(&Rect::new(0, 0, 20, 20), &Rect::new(5, 0, 20, 20), GROUP_EPS));
    }
}
