//! Built-in plugin factories.

mod alert;
mod event;

pub use alert::{EmailAlertFactory, FileAlertFactory};
pub use event::{LogProfileActivityFactory, LogProfileMissingFactory};

use orion_error::prelude::*;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::registry::BuildCtx;

fn kind_mismatch<T>(ctx: &BuildCtx<'_>, expected: &str, got: &str) -> RuntimeResult<T> {
    StructError::from(RuntimeReason::Bootstrap)
        .with_detail(format!(
            "{}: factory for {expected:?} handed a {got:?} config",
            ctx.name
        ))
        .err()
}
