use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::{Context, ContextSet};
use crate::{tags, Extractor, FeedError, Token, TokenSource};

/// Placeholder for a situation whose management type was never reported.
pub const TEXT_UNKNOWN: &str = "unknown";

/// Position of the comment text after a `comment` field: object start,
/// inner field name, text.
const COMMENT_TEXT_OFFSET: usize = 3;

/// One traffic situation (roadworks, incident, closure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRecord {
    pub id: String,
    pub description: String,
    pub link_name: String,
    pub local_link_name: String,
    pub town_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub latitude: String,
    pub longitude: String,
    pub overall_start_time: String,
    pub overall_end_time: String,
}

impl Default for TrafficRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            description: String::new(),
            link_name: String::new(),
            local_link_name: String::new(),
            town_name: String::new(),
            kind: TEXT_UNKNOWN.to_string(),
            latitude: String::new(),
            longitude: String::new(),
            overall_start_time: String::new(),
            overall_end_time: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficContext {
    SituationRecord,
    Attributes,
    Point,
    PointCoordinates,
    NonGeneralPublicComment,
}

impl Context for TrafficContext {
    const ALL: &'static [Self] = &[
        TrafficContext::SituationRecord,
        TrafficContext::Attributes,
        TrafficContext::Point,
        TrafficContext::PointCoordinates,
        TrafficContext::NonGeneralPublicComment,
    ];
    const BOUNDARY: Self = TrafficContext::SituationRecord;

    fn tag(self) -> &'static str {
        match self {
            TrafficContext::SituationRecord => tags::SITUATION_RECORD,
            TrafficContext::Attributes => tags::ATTRIBUTES,
            TrafficContext::Point => tags::POINT,
            TrafficContext::PointCoordinates => tags::POINT_COORDINATES,
            TrafficContext::NonGeneralPublicComment => tags::NON_GENERAL_PUBLIC_COMMENT,
        }
    }

    fn index(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ExpectValueOrDescriptor,
    Done,
}

/// Walks one `name` array. The latest `value` is held until the array
/// closes and is assigned by each `tpegDescriptorType` that follows it.
#[derive(Debug)]
struct NameScan {
    state: ScanState,
    depth: usize,
    value: Option<String>,
}

impl NameScan {
    /// Starts just after the array's opening bracket.
    fn new() -> Self {
        Self {
            state: ScanState::ExpectValueOrDescriptor,
            depth: 1,
            value: None,
        }
    }

    fn structure(&mut self, token: &Token) {
        match token {
            Token::ArrayStart => self.depth += 1,
            Token::ArrayEnd => {
                self.depth -= 1;
                if self.depth == 0 {
                    self.state = ScanState::Done;
                }
            }
            Token::EndOfStream => self.state = ScanState::Done,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct TrafficExtractor {
    working: TrafficRecord,
    contexts: ContextSet<TrafficContext>,
}

impl TrafficExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    async fn capture(
        slot: &mut String,
        tokens: &mut dyn TokenSource,
    ) -> Result<(), FeedError> {
        if let Some(value) = tokens.next_scalar().await? {
            *slot = value;
        }
        Ok(())
    }

    async fn scan_names(&mut self, tokens: &mut dyn TokenSource) -> Result<(), FeedError> {
        if tokens.peek_token().await? != &Token::ArrayStart {
            return Ok(());
        }
        tokens.next_token().await?;

        let mut scan = NameScan::new();
        while scan.state != ScanState::Done {
            let token = tokens.next_token().await?;
            match token.field_name() {
                Some(tags::VALUE) => {
                    if let Some(value) = tokens.next_scalar().await? {
                        scan.value = Some(value);
                    }
                }
                Some(tags::TPEG_DESCRIPTOR_TYPE) => {
                    let descriptor = tokens.next_scalar().await?;
                    if let (Some(descriptor), Some(value)) = (descriptor, &scan.value) {
                        self.assign_name(&descriptor, value.clone());
                    }
                }
                _ => scan.structure(&token),
            }
        }
        Ok(())
    }

    fn assign_name(&mut self, descriptor: &str, value: String) {
        let record = &mut self.working;
        match descriptor {
            tags::LINK_NAME => record.link_name = value,
            tags::LOCAL_LINK_NAME => record.local_link_name = value,
            tags::TOWN_NAME => record.town_name = value,
            other => trace!(descriptor = other, "ignoring name descriptor"),
        }
    }

    async fn skip_to_comment_text(
        &mut self,
        tokens: &mut dyn TokenSource,
    ) -> Result<(), FeedError> {
        for _ in 1..COMMENT_TEXT_OFFSET {
            tokens.next_token().await?;
        }
        Self::capture(&mut self.working.description, tokens).await
    }
}

#[async_trait]
impl Extractor for TrafficExtractor {
    type Record = TrafficRecord;

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
        use TrafficContext::*;

        let Some(field) = token.field_name() else {
            return Ok(());
        };
        if !self.contexts.is_open(SituationRecord) {
            return Ok(());
        }

        let record = &mut self.working;
        if self.contexts.is_open(Attributes) {
            if field == tags::ID {
                Self::capture(&mut record.id, tokens).await?;
            }
        } else if self.contexts.is_open(Point) {
            if self.contexts.is_open(PointCoordinates) {
                match field {
                    tags::LATITUDE => Self::capture(&mut record.latitude, tokens).await?,
                    tags::LONGITUDE => Self::capture(&mut record.longitude, tokens).await?,
                    _ => {}
                }
            } else if field == tags::NAME {
                self.scan_names(tokens).await?;
            }
        } else {
            match field {
                tags::NETWORK_MANAGEMENT_TYPE => Self::capture(&mut record.kind, tokens).await?,
                tags::OVERALL_START_TIME => {
                    Self::capture(&mut record.overall_start_time, tokens).await?
                }
                tags::OVERALL_END_TIME => {
                    Self::capture(&mut record.overall_end_time, tokens).await?
                }
                tags::COMMENT if self.contexts.is_open(NonGeneralPublicComment) => {
                    self.skip_to_comment_text(tokens).await?
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn populate(&mut self, record: &mut TrafficRecord) {
        *record = std::mem::take(&mut self.working);
        self.reset();
    }

    fn reset(&mut self) {
        self.working = TrafficRecord::default();
        self.contexts.clear();
    }

    fn is_inside_any_tracked_context(&self) -> bool {
        self.contexts.any_open()
    }
}
