use musette::store::RecordStore;
use musette::tcx;

fn trackpoint(time: &str, lat: f64, lng: f64, distance: f64) -> String {
    format!(
        "<Trackpoint>\
           <Time>{time}</Time>\
           <Position>\
             <LatitudeDegrees>{lat}</LatitudeDegrees>\
             <LongitudeDegrees>{lng}</LongitudeDegrees>\
           </Position>\
           <AltitudeMeters>1600</AltitudeMeters>\
           <DistanceMeters>{distance}</DistanceMeters>\
           <HeartRateBpm><Value>140</Value></HeartRateBpm>\
           <Cadence>80</Cadence>\
         </Trackpoint>"
    )
}

fn document(trackpoints: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\
         <TrainingCenterDatabase xmlns=\"http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2\">\
           <Activities>\
             <Activity Sport=\"Running\">\
               <Id>2020-06-01T10:00:00Z</Id>\
               <Lap StartTime=\"2020-06-01T10:00:00Z\">\
                 <TotalTimeSeconds>60</TotalTimeSeconds>\
                 <DistanceMeters>250</DistanceMeters>\
                 <Calories>12</Calories>\
                 <Track>{trackpoints}</Track>\
               </Lap>\
             </Activity>\
           </Activities>\
         </TrainingCenterDatabase>"
    )
}

fn decode(trackpoints: &str) -> RecordStore {
    let mut store = RecordStore::new(64, 8);
    let tree = tcx::parse(&document(trackpoints)).unwrap();
    tcx::flatten(&tree, &mut store).unwrap();
    store
}

#[test]
fn near_origin_point_is_dropped() {
    let points = [
        trackpoint("2020-06-01T10:00:00Z", 40.0, -105.0, 0.0),
        trackpoint("2020-06-01T10:00:05Z", 0.05, -0.05, 100.0),
        trackpoint("2020-06-01T10:00:10Z", 40.001, -105.001, 250.0),
    ]
    .concat();

    let store = decode(&points);
    // Exactly one fewer than supplied.
    assert_eq!(store.samples().len(), 2);
}

#[test]
fn near_equator_with_real_longitude_is_retained() {
    // Only the simultaneous near-origin signature marks a bad fix.
    let points = trackpoint("2020-06-01T10:00:00Z", 0.2, 40.0, 0.0);
    let store = decode(&points);
    assert_eq!(store.samples().len(), 1);
}

#[test]
fn first_sample_speed_is_unknown_not_fabricated() {
    let points = [
        trackpoint("2020-06-01T10:00:00Z", 40.0, -105.0, 0.0),
        trackpoint("2020-06-01T10:00:05Z", 40.001, -105.001, 100.0),
    ]
    .concat();

    let store = decode(&points);
    assert_eq!(store.samples()[0].speed, None);
    assert_eq!(store.samples()[1].speed, Some(20.0));
}

#[test]
fn speed_forward_fills_over_unresolved_intervals() {
    // The middle point carries no cumulative distance, so its speed
    // carries forward from the previous sample.
    let gap = "<Trackpoint>\
                 <Time>2020-06-01T10:00:10Z</Time>\
                 <Position>\
                   <LatitudeDegrees>40.002</LatitudeDegrees>\
                   <LongitudeDegrees>-105.002</LongitudeDegrees>\
                 </Position>\
               </Trackpoint>";
    let points = [
        trackpoint("2020-06-01T10:00:00Z", 40.0, -105.0, 0.0),
        trackpoint("2020-06-01T10:00:05Z", 40.001, -105.001, 100.0),
        gap.to_string(),
    ]
    .concat();

    let store = decode(&points);
    assert_eq!(store.samples().len(), 3);
    assert_eq!(store.samples()[2].speed, Some(20.0));
}

#[test]
fn lap_takes_start_from_first_trackpoint() {
    let points = [
        trackpoint("2020-06-01T10:00:00Z", 40.0, -105.0, 0.0),
        trackpoint("2020-06-01T10:01:00Z", 40.001, -105.001, 250.0),
    ]
    .concat();

    let store = decode(&points);
    assert_eq!(store.laps().len(), 1);

    let lap = &store.laps()[0];
    assert_eq!(lap.start_lat, Some(40.0));
    assert_eq!(lap.start_lng, Some(-105.0));
    assert_eq!(lap.total_distance, Some(250.0));
    assert_eq!(lap.total_elapsed_time, Some(60.0));

    // This source has no end position, calories, or timer time per lap.
    assert_eq!(lap.end_lat, None);
    assert_eq!(lap.end_lng, None);
    assert_eq!(lap.total_calories, None);
    assert_eq!(lap.total_timer_time, None);
}

#[test]
fn session_fields_absent_from_tree_stay_absent() {
    let points = [
        trackpoint("2020-06-01T10:00:00Z", 40.0, -105.0, 0.0),
        trackpoint("2020-06-01T10:01:00Z", 40.001, -105.001, 250.0),
    ]
    .concat();

    let store = decode(&points);
    let session = store.session();

    assert_eq!(session.total_distance, Some(250.0));
    assert_eq!(session.total_calories, Some(12.0));
    assert_eq!(session.start_position_lat, Some(40.0));
    assert_eq!(session.avg_heart_rate, Some(140.0));
    // 250 m over the 60 s between first and last point.
    let avg = session.avg_speed.unwrap();
    assert!((avg - 250.0 / 60.0).abs() < 1e-9);

    assert_eq!(session.nec_lat, None);
    assert_eq!(session.swc_long, None);
    assert_eq!(session.total_work, None);
    assert_eq!(session.total_moving_time, None);
    assert_eq!(session.avg_lap_time, None);
    assert_eq!(session.avg_temperature, None);
    assert_eq!(session.total_anaerobic_training_effect, None);
}

#[test]
fn unparseable_document_is_a_tree_error() {
    assert!(tcx::parse("not xml at all").is_err());
    assert!(tcx::parse("<Empty/>").is_err());
}
