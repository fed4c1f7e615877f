//! End-to-end URL compilation against TripPin-shaped resources.

use odata_query::{ODataResource, QueryError};
use serde_json::json;

fn root() -> ODataResource {
    ODataResource::new("https://services.odata.org/TripPinRESTierService").unwrap()
}

#[test]
fn deep_navigation_with_keys() {
    let url = root()
        .entity_set("People")
        .key(json!("russellwhyte"))
        .unwrap()
        .navigation_property("Friends")
        .unwrap()
        .key(json!("mirsking"))
        .unwrap()
        .navigation_property("Trips")
        .unwrap()
        .url()
        .unwrap();
    assert_eq!(
        url,
        "https://services.odata.org/TripPinRESTierService/People('russellwhyte')/Friends('mirsking')/Trips"
    );
}

#[test]
fn full_query_option_surface() {
    let (path, params) = root()
        .entity_set("People")
        .select(json!(["FirstName", "LastName"]))
        .filter(json!({"Trips": {"any": {"Budget": {"gt": 3000}}}}))
        .order_by(json!({"LastName": 1}))
        .top(5)
        .skip(10)
        .expand(json!("Friends/Trips"))
        .path_and_params()
        .unwrap();
    assert_eq!(path, "People");
    assert_eq!(
        params,
        vec![
            ("$select".to_owned(), "FirstName,LastName".to_owned()),
            (
                "$filter".to_owned(),
                "Trips/any(x:x/Budget gt 3000)".to_owned()
            ),
            ("$orderby".to_owned(), "LastName asc".to_owned()),
            ("$top".to_owned(), "5".to_owned()),
            ("$skip".to_owned(), "10".to_owned()),
            (
                "$expand".to_owned(),
                "Friends($expand=Trips)".to_owned()
            ),
        ]
    );
}

#[test]
fn alias_parameters_follow_every_option() {
    let (_, params) = root()
        .entity_set("People")
        .filter(json!({"Location/City": odata_query::alias("city", json!("Boise"))}))
        .top(1)
        .path_and_params()
        .unwrap();
    assert_eq!(
        params,
        vec![
            ("$filter".to_owned(), "Location/City eq @city".to_owned()),
            ("$top".to_owned(), "1".to_owned()),
            ("@city".to_owned(), "'Boise'".to_owned()),
        ]
    );
}

#[test]
fn singleton_property_raw_value() {
    let url = root()
        .singleton("Me")
        .property("UserName")
        .value()
        .url()
        .unwrap();
    assert!(url.ends_with("/Me/UserName/$value"));
}

#[test]
fn resource_round_trips_through_serde() {
    let resource = root()
        .entity_set("People")
        .key(json!("russellwhyte"))
        .unwrap()
        .select(json!(["FirstName"]));
    let snapshot = serde_json::to_string(&resource).unwrap();
    let restored: ODataResource = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(restored, resource);
    assert_eq!(restored.url().unwrap(), resource.url().unwrap());
}

#[test]
fn missing_key_surfaces_typed_error() {
    let err = root()
        .entity_set("People")
        .navigation_property("Friends")
        .unwrap_err();
    assert!(matches!(err, QueryError::MissingKey));
}
