use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextSet};
use crate::{tags, Extractor, FeedError, Token, TokenSource};

/// Occupancy snapshot for one car park.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarParkRecord {
    pub id: String,
    pub latitude: String,
    pub longitude: String,
    pub car_park_identity: String,
    pub car_park_occupancy: String,
    pub car_park_status: String,
    pub occupied_spaces: String,
    pub total_capacity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarParkContext {
    SituationRecord,
    Attributes,
    PointCoordinates,
}

impl Context for CarParkContext {
    const ALL: &'static [Self] = &[
        CarParkContext::SituationRecord,
        CarParkContext::Attributes,
        CarParkContext::PointCoordinates,
    ];
    const BOUNDARY: Self = CarParkContext::SituationRecord;

    fn tag(self) -> &'static str {
        match self {
            CarParkContext::SituationRecord => tags::SITUATION_RECORD,
            CarParkContext::Attributes => tags::ATTRIBUTES,
            CarParkContext::PointCoordinates => tags::POINT_COORDINATES,
        }
    }

    fn index(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Default)]
pub struct CarParkExtractor {
    working: CarParkRecord,
    contexts: ContextSet<CarParkContext>,
}

impl CarParkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, field: &str) -> Option<&mut String> {
        use CarParkContext::*;

        let record = &mut self.working;
        if self.contexts.is_open(Attributes) {
            return (field == tags::ID).then_some(&mut record.id);
        }
        if self.contexts.is_open(PointCoordinates) {
            return match field {
                tags::LATITUDE => Some(&mut record.latitude),
                tags::LONGITUDE => Some(&mut record.longitude),
                _ => None,
            };
        }
        match field {
            tags::CAR_PARK_IDENTITY => Some(&mut record.car_park_identity),
            tags::CAR_PARK_OCCUPANCY => Some(&mut record.car_park_occupancy),
            tags::CAR_PARK_STATUS => Some(&mut record.car_park_status),
            tags::OCCUPIED_SPACES => Some(&mut record.occupied_spaces),
            tags::TOTAL_CAPACITY => Some(&mut record.total_capacity),
            _ => None,
        }
    }
}

#[async_trait]
impl Extractor for CarParkExtractor {
    type Record = CarParkRecord;

    fn on_object_start(&mut self, name: &str) -> bool {
        self.contexts.open(name)
    }

    fn on_object_end(&mut self, name: &str) -> bool {
        self.contexts.close(name)
    }

    async fn on_token(
        &mut self,
        token: &Token,
        tokens: &mut dyn TokenSource,
    ) -> Result<(), FeedError> {
        let Some(field) = token.field_name() else {
            return Ok(());
        };
        if !self.contexts.is_open(CarParkContext::SituationRecord) {
            return Ok(());
        }
        if let Some(slot) = self.slot(field) {
            if let Some(value) = tokens.next_scalar().await? {
                *slot = value;
            }
        }
        Ok(())
    }

    fn populate(&mut self, record: &mut CarParkRecord) {
        *record = std::mem::take(&mut self.working);
        self.reset();
    }

    fn reset(&mut self) {
        self.working = CarParkRecord::default();
        self.contexts.clear();
    }

    fn is_inside_any_tracked_context(&self) -> bool {
        self.contexts.any_open()
    }
}
