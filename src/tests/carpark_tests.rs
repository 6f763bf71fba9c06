#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::tests::fixtures::{car_park_situation, feed, CAR_PARK_SINGLE};
    use crate::{CarParkExtractor, CarParkRecord, Extractor, FeedParser, RunState, Token, VecTokenSource};

    async fn parse(doc: &str) -> (RunState, Vec<CarParkRecord>) {
        let mut parser = FeedParser::new();
        let mut records = Vec::new();
        let state = parser
            .run(
                Cursor::new(doc.as_bytes().to_vec()),
                &mut records,
                &CarParkRecord::default,
                &mut CarParkExtractor::new(),
            )
            .await;
        (state, records)
    }

    #[tokio::test]
    async fn test_single_car_park() {
        let (state, records) = parse(CAR_PARK_SINGLE).await;
        assert_eq!(state, RunState::Done);
        assert_eq!(
            records,
            vec![CarParkRecord {
                id: "CP1".into(),
                latitude: "55.86".into(),
                longitude: "-4.25".into(),
                car_park_identity: "X1".into(),
                occupied_spaces: "10".into(),
                total_capacity: "100".into(),
                ..Default::default()
            }]
        );
        assert!(records[0].car_park_status.is_empty());
        assert!(records[0].car_park_occupancy.is_empty());
    }

    #[tokio::test]
    async fn test_records_in_document_order() {
        let doc = feed(&[
            car_park_situation("CP1", "Buchanan Galleries", 120, 2000),
            car_park_situation("CP2", "Concert Square", 45, 400),
            car_park_situation("CP3", "Dundasvale", 0, 250),
        ]);
        let (state, records) = parse(&doc).await;
        assert_eq!(state, RunState::Done);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["CP1", "CP2", "CP3"]);
        assert_eq!(records[1].car_park_identity, "Concert Square");
        assert_eq!(records[1].occupied_spaces, "45");
        assert_eq!(records[2].car_park_status, "spacesAvailable");
    }

    #[tokio::test]
    async fn test_fields_are_captured_only_in_their_context() {
        let doc = r#"{
            "carParkIdentity": "outside any record",
            "situation": [{"situationRecord": {
                "id": "not an attribute",
                "latitude": "1.0",
                "@attributes": {"id": "CP9", "carParkIdentity": "inside attributes"},
                "pointCoordinates": {"latitude": "55.1", "longitude": "-4.1", "totalCapacity": "7"},
                "carParkIdentity": "Anderston"
            }}]
        }"#;
        let (state, records) = parse(doc).await;
        assert_eq!(state, RunState::Done);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "CP9");
        assert_eq!(record.latitude, "55.1");
        assert_eq!(record.car_park_identity, "Anderston");
        assert!(record.total_capacity.is_empty());
    }

    #[tokio::test]
    async fn test_no_leakage_between_records() {
        let doc = r#"{"situation": [
            {"situationRecord": {"@attributes": {"id": "A"}, "carParkStatus": "full"}},
            {"situationRecord": {"@attributes": {"id": "B"}}}
        ]}"#;
        let (_, records) = parse(doc).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].car_park_status, "full");
        assert!(records[1].car_park_status.is_empty());
    }

    #[tokio::test]
    async fn test_non_scalar_value_is_not_captured() {
        let doc = r#"{"situationRecord": {
            "carParkIdentity": {"value": "X"},
            "occupiedSpaces": "3"
        }}"#;
        let (state, records) = parse(doc).await;
        assert_eq!(state, RunState::Done);
        assert!(records[0].car_park_identity.is_empty());
        assert_eq!(records[0].occupied_spaces, "3");
    }

    #[tokio::test]
    async fn test_boundary_must_be_opened_before_it_closes() {
        let mut extractor = CarParkExtractor::new();
        assert!(!extractor.on_object_end("situationRecord"));
        assert!(!extractor.on_object_start("payloadPublication"));
        assert!(extractor.on_object_start("situationRecord"));
        assert!(extractor.is_inside_any_tracked_context());
        assert!(!extractor.on_object_end("@attributes"));
        assert!(extractor.on_object_end("situationRecord"));
        assert!(!extractor.is_inside_any_tracked_context());
    }

    #[tokio::test]
    async fn test_reset_matches_post_populate_defaults() {
        let mut fresh = CarParkRecord {
            id: "stale".into(),
            ..Default::default()
        };
        CarParkExtractor::new().populate(&mut fresh);

        let mut extractor = CarParkExtractor::new();
        let mut tokens = VecTokenSource::new(vec![Token::ScalarValue("X9".into())]);
        extractor.on_object_start("situationRecord");
        extractor
            .on_token(&Token::FieldName("carParkIdentity".into()), &mut tokens)
            .await
            .unwrap();
        let mut first = CarParkRecord::default();
        extractor.populate(&mut first);
        assert_eq!(first.car_park_identity, "X9");

        let mut after = CarParkRecord::default();
        extractor.populate(&mut after);
        assert_eq!(after, fresh);

        extractor.on_object_start("@attributes");
        extractor.reset();
        assert!(!extractor.is_inside_any_tracked_context());
        let mut after_reset = CarParkRecord::default();
        extractor.populate(&mut after_reset);
        assert_eq!(after_reset, fresh);
    }
}
