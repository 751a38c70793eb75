use approx::assert_relative_eq;
use travel_inference_core::*;

#[test]
fn rssi_filter_and_confidence() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let out = engine
        .detect_companions(
            Some("trip-7"),
            &[
                ProximityReading::new("aa:01", "Phone", -65.0),
                ProximityReading::new("aa:02", "Watch", -80.0),
                ProximityReading::new("aa:03", "Tablet", -55.0),
            ],
        )
        .unwrap();

    assert!(out.companions_detected);
    assert_eq!(out.companion_count, 2);
    assert_eq!(out.trip_id.as_deref(), Some("trip-7"));
    assert!(out.companions.iter().all(|c| c.device_id != "aa:02"));

    let phone = out.companions.iter().find(|c| c.device_id == "aa:01").unwrap();
    assert_eq!(phone.confidence, 1.0);
    assert_eq!(phone.proximity, ProximityTier::Near);
    let tablet = out.companions.iter().find(|c| c.device_id == "aa:03").unwrap();
    assert_eq!(tablet.proximity, ProximityTier::Close);
}

#[test]
fn kept_companions_tie_at_full_confidence_and_keep_input_order() {
    let mut config = EngineConfig::default();
    config.companion.max_companions = 2;
    let engine = TravelInferenceEngine::new(config).unwrap();

    let readings = [
        ProximityReading::new("first", "A", -68.0),
        ProximityReading::new("excluded", "X", -90.0),
        ProximityReading::new("second", "B", -50.0),
        ProximityReading::new("third", "C", -65.0),
    ];
    let out = engine.detect_companions(None, &readings).unwrap();
    let ids: Vec<_> = out.companions.iter().map(|c| c.device_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert_eq!(out.companion_count, 2);
    assert!(out.companions.iter().all(|c| c.confidence == 1.0));
    assert_relative_eq!(companion::rssi_confidence(-75.0), 25.0 / 30.0, max_relative = 1e-12);
}

#[test]
fn default_config_caps_at_ten_companions() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let readings: Vec<ProximityReading> = (0..12)
        .map(|i| ProximityReading::new(&format!("dev-{i:02}"), "Phone", -50.0 - i as f64))
        .collect();

    let out = engine.detect_companions(Some("bus-ride"), &readings).unwrap();
    assert_eq!(out.companion_count, 10);
    assert_eq!(out.companions.len(), 10);
    assert_eq!(out.companions[0].device_id, "dev-00");
    assert_eq!(out.companions[9].device_id, "dev-09");
}

#[test]
fn no_readings_means_no_companions() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let out = engine.detect_companions(None, &[]).unwrap();
    assert!(!out.companions_detected);
    assert_eq!(out.companion_count, 0);
    assert_eq!(engine.metrics().classification_count("companions", "none"), 1);
}

fn kochi() -> GeoPoint {
    GeoPoint::new(9.9312, 76.2673)
}

fn thrissur() -> GeoPoint {
    GeoPoint::new(10.5276, 76.2144)
}

#[test]
fn scenic_request_prefers_scenic() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let prefs = RoutePreferences { avoid_traffic: true, scenic: true, avoid_tolls: false };
    let rec = engine.score_routes(kochi(), thrissur(), &prefs).unwrap();
    assert_eq!(rec.preferred.category, RouteCategory::Scenic);
    assert_eq!(rec.preferred.via, vec!["Coastal road", "Hill station"]);
    assert!(rec.straight_line_km > 60.0 && rec.straight_line_km < 70.0);
}

#[test]
fn avoid_traffic_prefers_minimal_duration() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let rec = engine
        .score_routes(kochi(), thrissur(), &RoutePreferences::default())
        .unwrap();
    let best = rec
        .alternatives
        .iter()
        .map(|c| c.duration_min)
        .fold(rec.preferred.duration_min, f64::min);
    assert_eq!(rec.preferred.duration_min, best);
    assert_eq!(rec.preferred.category, RouteCategory::Fastest);
    assert_eq!(rec.alternatives.len(), 1);
}

#[test]
fn avoiding_tolls_clears_the_toll_flag() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let prefs = RoutePreferences { avoid_traffic: false, scenic: false, avoid_tolls: true };
    let rec = engine.score_routes(kochi(), thrissur(), &prefs).unwrap();
    assert!(!rec.preferred.has_tolls);
    assert!(rec.alternatives.iter().all(|c| !c.has_tolls));
}

#[test]
fn route_rejects_bad_coordinates() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let err = engine
        .score_routes(GeoPoint::new(95.0, 0.0), thrissur(), &RoutePreferences::default())
        .unwrap_err();
    assert!(matches!(err, InferenceError::InvalidCoordinate { .. }));
    assert_eq!(engine.metrics().error_count("score_routes", "invalid_coordinate"), 1);
}

#[test]
fn geofences_report_every_fence() {
    let engine = TravelInferenceEngine::with_defaults().unwrap();
    let fences: Vec<Geofence> = serde_json::from_str(
        r#"[
            {"id":"home","name":"Home","center_lat":9.9312,"center_lng":76.2673},
            {"id":"office","center_lat":9.9312,"center_lng":76.2700,"radius":50}
        ]"#,
    )
    .unwrap();
    let hits = engine.check_geofences(GeoPoint::new(9.9313, 76.2673), &fences).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].is_inside);
    assert!(!hits[1].is_inside);
    assert_eq!(hits[1].fence_id.as_deref(), Some("office"));
}
