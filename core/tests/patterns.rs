use approx::assert_abs_diff_eq;
use std::path::Path;
use travel_inference_core::*;

fn load_trips(name: &str) -> Vec<TripRecord> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    let mut rdr = csv::Reader::from_path(&path).expect("fixture missing");
    rdr.deserialize()
        .collect::<std::result::Result<Vec<TripRecord>, _>>().expect("bad fixture row")
}

#[test]
fn summary_from_fixture() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let trips = load_trips("trips.csv");
    assert_eq!(trips.len(), 5);
    assert_eq!(trips[0].subject_id, "u42");

    let s = engine.aggregate_patterns("u42", &trips).unwrap();
    assert_eq!(s.total_trips, 5);
    assert_abs_diff_eq!(s.total_distance, 34.7, epsilon = 1e-9);
    assert_abs_diff_eq!(s.avg_distance, 6.94, epsilon = 1e-9);
    assert_abs_diff_eq!(s.avg_duration, 23.2, epsilon = 1e-9);
    assert_eq!(s.preferred_mode, "car");
    assert_eq!(s.mode_distribution.count("car"), 3);
    assert_eq!(s.primary_purpose, "work");
    assert_abs_diff_eq!(s.travel_frequency, 5.0 / 30.0, epsilon = 1e-12);
    assert_eq!(
        s.insights,
        vec!["You prefer personal vehicle for most trips", "Most of your trips are work-related"]
    );
}

#[test]
fn zero_trips_zero_summary() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let s = engine.aggregate_patterns("nobody", &[]).unwrap();
    assert_eq!(s.total_trips, 0);
    assert_eq!(s.total_distance, 0.0);
    assert_eq!(s.total_duration, 0.0);
    assert_eq!(s.avg_distance, 0.0);
    assert!(s.mode_distribution.entries().is_empty());
    assert!(s.insights.is_empty());
}

#[test]
fn long_public_transport_trips() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let trips = vec![
        TripRecord::new("u7", "train", "tourism", 180.0, 200.0),
        TripRecord::new("u7", "train", "leisure", 90.0, 110.0),
        TripRecord::new("u7", "bus", "leisure", 40.0, 60.0),
    ];
    let s = engine.aggregate_patterns("u7", &trips).unwrap();
    assert_eq!(
        s.insights,
        vec![
            "Great job using public transport!",
            "You travel frequently for leisure activities",
            "You're a long-distance traveler",
        ]
    );
}

#[test]
fn window_comes_from_config() {
    let mut config = EngineConfig::default();
    config.pattern.frequency_window_days = 7.0;
    let engine = TravelInferenceEngine::new(config).unwrap();
    let s = engine.aggregate_patterns("u42", &load_trips("trips.csv")).unwrap();
    assert_abs_diff_eq!(s.travel_frequency, 5.0 / 7.0, epsilon = 1e-12);
}

#[test]
fn summary_serializes_histograms_in_first_seen_order() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let s = engine.aggregate_patterns("u42", &load_trips("trips.csv")).unwrap();
    let json = serde_json::to_string(&s.mode_distribution).unwrap();
    assert_eq!(json, r#"{"car":3,"bus":1,"walk":1}"#);
}
