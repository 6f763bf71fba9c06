//! Object and field names of the Datex II JSON feeds.

// Contexts
pub const SITUATION_RECORD: &str = "situationRecord";
pub const ATTRIBUTES: &str = "@attributes";
pub const POINT: &str = "point";
pub const POINT_COORDINATES: &str = "pointCoordinates";
pub const NON_GENERAL_PUBLIC_COMMENT: &str = "nonGeneralPublicComment";

// Shared fields
pub const ID: &str = "id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

// Car parks
pub const CAR_PARK_IDENTITY: &str = "carParkIdentity";
pub const CAR_PARK_OCCUPANCY: &str = "carParkOccupancy";
pub const CAR_PARK_STATUS: &str = "carParkStatus";
pub const OCCUPIED_SPACES: &str = "occupiedSpaces";
pub const TOTAL_CAPACITY: &str = "totalCapacity";

// Traffic
pub const NETWORK_MANAGEMENT_TYPE: &str = "networkManagementType";
pub const OVERALL_START_TIME: &str = "overallStartTime";
pub const OVERALL_END_TIME: &str = "overallEndTime";
pub const COMMENT: &str = "comment";
pub const NAME: &str = "name";
pub const VALUE: &str = "value";
pub const TPEG_DESCRIPTOR_TYPE: &str = "tpegDescriptorType";

// Descriptor types found in `name` arrays
pub const LINK_NAME: &str = "linkName";
pub const LOCAL_LINK_NAME: &str = "localLinkName";
pub const TOWN_NAME: &str = "townName";
