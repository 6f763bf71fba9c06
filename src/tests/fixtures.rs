//! Feed documents shared by the test modules.

pub const CAR_PARK_SINGLE: &str = r#"{
  "d2LogicalModel": {
    "payloadPublication": {
      "situation": [
        {
          "situationRecord": {
            "@attributes": { "id": "CP1", "version": "3" },
            "groupOfLocations": {
              "locationContainedInGroup": {
                "tpegpointLocation": {
                  "point": {
                    "pointCoordinates": { "latitude": "55.86", "longitude": "-4.25" }
                  }
                }
              }
            },
            "carParkIdentity": "X1",
            "occupiedSpaces": "10",
            "totalCapacity": "100"
          }
        }
      ]
    }
  }
}"#;

pub const TRAFFIC_SINGLE: &str = r#"{
  "situation": [
    {
      "situationRecord": {
        "@attributes": { "id": "GT1" },
        "validity": {
          "validityTimeSpecification": {
            "overallStartTime": "2014-03-01T08:00:00",
            "overallEndTime": "2014-03-02T18:00:00"
          }
        },
        "networkManagementType": "laneClosures",
        "nonGeneralPublicComment": { "comment": { "value": "Nearside lane closed" } },
        "groupOfLocations": {
          "tpegpointLocation": {
            "point": {
              "pointCoordinates": { "latitude": "55.8601", "longitude": "-4.2653" },
              "name": [
                { "descriptor": { "value": "M8" }, "tpegDescriptorType": "linkName" },
                { "descriptor": { "value": "Kingston Bridge" }, "tpegDescriptorType": "localLinkName" },
                { "descriptor": { "value": "Glasgow" }, "tpegDescriptorType": "townName" }
              ]
            }
          }
        }
      }
    }
  ]
}"#;

/// A car-park situation element with the given id and identity.
pub fn car_park_situation(id: &str, identity: &str, occupied: u32, capacity: u32) -> String {
    format!(
        r#"{{"situationRecord": {{
            "@attributes": {{"id": {}}},
            "pointCoordinates": {{"latitude": "55.8", "longitude": "-4.2"}},
            "carParkIdentity": {},
            "carParkStatus": "spacesAvailable",
            "occupiedSpaces": "{occupied}",
            "totalCapacity": "{capacity}"
        }}}}"#,
        quote(id),
        quote(identity),
    )
}

/// Wraps situation elements in a feed document.
pub fn feed(situations: &[String]) -> String {
    format!(r#"{{"situation": [{}]}}"#, situations.join(","))
}

/// JSON string literal for `text`, escapes included.
pub fn quote(text: &str) -> String {
    simd_json::to_string(&String::from(text)).expect("strings always serialize")
}
