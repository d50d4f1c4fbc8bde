use chrono::NaiveDate;
use raindust::{great_circle_m, nearest_same_day, DatedPoint, LatLon};

/// Small deterministic generator so the point sets are reproducible.
struct XorShift(u64);

impl XorShift {
    fn next_f64(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn point(&mut self, days: &[NaiveDate]) -> DatedPoint {
        let day = days[(self.next_f64() * days.len() as f64) as usize % days.len()];
        // Corsica and the southern Alps, a few hundred kilometers across
        let lat = 41.3 + self.next_f64() * 3.5;
        let lon = 5.5 + self.next_f64() * 4.2;
        DatedPoint::new(day, LatLon(lat, lon))
    }
}

/// Exhaustive search: nearest same-day target and its distance, lowest index on ties.
fn brute_force(query: &DatedPoint, targets: &[DatedPoint]) -> Option<(usize, f64)> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.date == query.date)
        .map(|(i, t)| (i, great_circle_m(query.location, t.location)))
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
}

#[test]
fn test_matches_exhaustive_search() {
    let days: Vec<NaiveDate> = (1..=6)
        .map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
        .collect();
    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);
    let queries: Vec<DatedPoint> = (0..400).map(|_| rng.point(&days)).collect();
    // Targets skip the last day entirely
    let targets: Vec<DatedPoint> = (0..900).map(|_| rng.point(&days[..5])).collect();

    for max_distance_m in [5_000.0, 20_000.0, 50_000.0] {
        let matches = nearest_same_day(&queries, &targets, max_distance_m, false);

        let mut expected_count = 0;
        for (q, query) in queries.iter().enumerate() {
            let found = matches.iter().find(|m| m.query == q);
            match brute_force(query, &targets) {
                Some((target, distance)) if distance <= max_distance_m => {
                    expected_count += 1;
                    let found = found.unwrap_or_else(|| panic!("query {q} should match"));
                    assert_eq!(found.target, target, "query {q}");
                    assert!((found.distance_m - distance).abs() < 1e-6);
                }
                _ => assert!(found.is_none(), "query {q} should not match"),
            }
        }
        assert_eq!(matches.len(), expected_count);
        assert_eq!(
            nearest_same_day(&queries, &targets, max_distance_m, true),
            matches
        );
    }
}

#[test]
fn test_each_query_matched_once_in_day_order() {
    let days: Vec<NaiveDate> = (1..=3)
        .map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
        .collect();
    let mut rng = XorShift(42);
    let queries: Vec<DatedPoint> = (0..200).map(|_| rng.point(&days)).collect();
    let targets: Vec<DatedPoint> = (0..200).map(|_| rng.point(&days)).collect();

    let matches = nearest_same_day(&queries, &targets, 1e9, false);

    assert_eq!(matches.len(), queries.len());
    let order: Vec<(NaiveDate, usize)> = matches
        .iter()
        .map(|m| (queries[m.query].date, m.query))
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
    for m in &matches {
        assert_eq!(queries[m.query].date, targets[m.target].date);
    }
}
