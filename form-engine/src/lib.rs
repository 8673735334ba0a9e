//! Form schema evaluation engine
//!
//! Pure, synchronous building blocks behind the form builder:
//! 1. `schema`: field definitions and their structural rules
//! 2. `condition`: show/hide evaluation against submitted values
//! 3. `steps`: multi-step pagination at page-break fields
//! 4. `validation`: per-field submission errors, scoped to visible fields
//! 5. `export`: CSV export of collected responses
//!
//! plus response filtering, statistics and notification composition used by
//! the responses dashboard and the submission pipeline.

pub mod condition;
pub mod export;
pub mod filter;
pub mod notify;
pub mod schema;
pub mod stats;
pub mod steps;
pub mod types;
pub mod validation;

pub use condition::{is_visible, visible_fields};
pub use export::export_to_csv;
pub use filter::{filter_options, filter_responses, ResponseFilter};
pub use notify::{compose_notification, validate_recipients, Notification, NotifyError};
pub use schema::{
    check_fields, dangling_conditions, ConditionOperator, Field, FieldId, FieldType, RawField,
    SchemaError, ShowCondition,
};
pub use stats::{response_stats, ResponseStats, Trend};
pub use steps::{partition_steps, partition_titled, Step};
pub use types::{
    lookup, FieldValue, Form, FormId, FormSettings, FormStyle, NotificationSettings, Response,
    ResponseData, ResponseId, ThankYouSettings,
};
pub use validation::{is_valid_email, validate, validate_step, FieldError};
