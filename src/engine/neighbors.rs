// Related-star selection: exact topic match first, proximity second.
//
// Feeds both the connection-line renderer and the answer panel's related
// list, so both always agree on what "related" means.

use super::star::Star;

/// How many related stars the panel and the connector lines show.
pub const NEIGHBOR_COUNT: usize = 3;

/// Pick up to `k` stars related to `root` from `candidates`.
///
/// Candidates sharing the root's topic (exact match, both labeled) win
/// outright: the result is drawn from that subset alone, ordered by distance
/// to the root. Only when no topic peer exists does plain proximity over the
/// whole remainder apply. Sorting is stable, so equal distances keep their
/// enumeration order. Short candidate lists come back whole.
pub fn select_neighbors<'a>(root: &Star, candidates: &'a [Star], k: usize) -> Vec<&'a Star> {
    let others: Vec<&Star> = candidates.iter().filter(|s| s.id != root.id).collect();

    let mut pool: Vec<&Star> = if let Some(topic) = root.topic.as_deref() {
        let same_topic: Vec<&Star> = others
            .iter()
            .copied()
            .filter(|s| s.topic.as_deref() == Some(topic))
            .collect();
        if same_topic.is_empty() { others } else { same_topic }
    } else {
        others
    };

    pool.sort_by(|a, b| {
        let da = a.position.distance_squared(root.position);
        let db = b.position.distance_squared(root.position);
        da.total_cmp(&db)
    });
    pool.truncate(k);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::star::StarId;
    use glam::Vec3;

    fn star(id: u64, topic: Option<&str>, pos: Vec3) -> Star {
        let mut s = Star::new(StarId(id), format!("q{id}"), pos);
        s.topic = topic.map(str::to_string);
        s
    }

    fn line_of(n: u64, topic: Option<&str>) -> Vec<Star> {
        (1..=n)
            .map(|i| star(i, topic, Vec3::new(i as f32, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn returns_k_when_enough_candidates() {
        let root = star(0, None, Vec3::ZERO);
        let candidates = line_of(6, None);
        assert_eq!(select_neighbors(&root, &candidates, 3).len(), 3);
    }

    #[test]
    fn returns_all_when_fewer_than_k() {
        let root = star(0, None, Vec3::ZERO);
        let candidates = line_of(2, None);
        assert_eq!(select_neighbors(&root, &candidates, 3).len(), 2);
    }

    #[test]
    fn root_is_never_its_own_neighbor() {
        let root = star(1, None, Vec3::new(1.0, 0.0, 0.0));
        let candidates = line_of(4, None);
        let picked = select_neighbors(&root, &candidates, 4);
        assert!(picked.iter().all(|s| s.id != root.id));
    }

    #[test]
    fn topic_peers_exclude_everything_else() {
        let root = star(0, Some("Science"), Vec3::ZERO);
        let candidates = vec![
            // A very close off-topic star must still lose to distant peers.
            star(1, Some("Art"), Vec3::new(0.5, 0.0, 0.0)),
            star(2, Some("Science"), Vec3::new(30.0, 0.0, 0.0)),
            star(3, Some("Science"), Vec3::new(40.0, 0.0, 0.0)),
            star(4, None, Vec3::new(0.1, 0.0, 0.0)),
        ];
        let picked = select_neighbors(&root, &candidates, 3);
        assert_eq!(picked.len(), 2);
        assert!(
            picked
                .iter()
                .all(|s| s.topic.as_deref() == Some("Science"))
        );
    }

    #[test]
    fn unlabeled_root_falls_back_to_proximity() {
        let root = star(0, None, Vec3::ZERO);
        let candidates = vec![
            star(1, Some("Art"), Vec3::new(5.0, 0.0, 0.0)),
            star(2, Some("Science"), Vec3::new(1.0, 0.0, 0.0)),
            star(3, None, Vec3::new(3.0, 0.0, 0.0)),
        ];
        let ids: Vec<u64> = select_neighbors(&root, &candidates, 2)
            .iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn sorted_by_distance_ascending() {
        let root = star(0, None, Vec3::ZERO);
        let candidates = vec![
            star(1, None, Vec3::new(9.0, 0.0, 0.0)),
            star(2, None, Vec3::new(1.0, 0.0, 0.0)),
            star(3, None, Vec3::new(4.0, 0.0, 0.0)),
        ];
        let ids: Vec<u64> = select_neighbors(&root, &candidates, 3)
            .iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn equal_distances_keep_enumeration_order() {
        let root = star(0, None, Vec3::ZERO);
        let candidates = vec![
            star(5, None, Vec3::new(0.0, 0.0, 2.0)),
            star(9, None, Vec3::new(2.0, 0.0, 0.0)),
            star(1, None, Vec3::new(0.0, 2.0, 0.0)),
        ];
        let ids: Vec<u64> = select_neighbors(&root, &candidates, 3)
            .iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec![5, 9, 1]);
    }
}
