use cm_config::EventConfig;
use cm_core::event::{AzLogProfileMissing, AzLogProfileMissingActivityType, EventPlugin};

use super::kind_mismatch;
use crate::error::RuntimeResult;
use crate::registry::{BuildCtx, EventFactory};

const ACTIVITY_KIND: &str = "az_log_profile_missing_activity_type";
const MISSING_KIND: &str = "az_log_profile_missing";

pub struct LogProfileActivityFactory;

impl EventFactory for LogProfileActivityFactory {
    fn kind(&self) -> &'static str {
        ACTIVITY_KIND
    }

    fn build(
        &self,
        config: &EventConfig,
        ctx: &BuildCtx<'_>,
    ) -> RuntimeResult<Box<dyn EventPlugin>> {
        match config {
            EventConfig::AzLogProfileMissingActivityType => Ok(Box::new(
                AzLogProfileMissingActivityType::new().with_span(ctx.event_span(ACTIVITY_KIND)),
            )),
            other => kind_mismatch(ctx, ACTIVITY_KIND, other.kind()),
        }
    }
}

pub struct LogProfileMissingFactory;

impl EventFactory for LogProfileMissingFactory {
    fn kind(&self) -> &'static str {
        MISSING_KIND
    }

    fn build(
        &self,
        config: &EventConfig,
        ctx: &BuildCtx<'_>,
    ) -> RuntimeResult<Box<dyn EventPlugin>> {
        match config {
            EventConfig::AzLogProfileMissing => Ok(Box::new(
                AzLogProfileMissing::new().with_span(ctx.event_span(MISSING_KIND)),
            )),
            other => kind_mismatch(ctx, MISSING_KIND, other.kind()),
        }
    }
}
