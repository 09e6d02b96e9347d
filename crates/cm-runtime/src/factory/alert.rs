use cm_config::{AlertConfig, EmailAlertConfig};
use cm_core::alert::{AlertPlugin, EmailAlert, FileAlert};
use cm_core::{cm_debug, cm_warn};
use orion_error::prelude::*;

use super::kind_mismatch;
use crate::error::{RuntimeReason, RuntimeResult};
use crate::registry::{AlertFactory, BuildCtx};

const EMAIL_KIND: &str = "email";
const FILE_KIND: &str = "file";

pub struct EmailAlertFactory;

impl EmailAlertFactory {
    fn config<'c>(ctx: &BuildCtx<'_>, config: &'c AlertConfig) -> RuntimeResult<&'c EmailAlertConfig> {
        match config {
            AlertConfig::Email(cfg) => Ok(cfg),
            other => kind_mismatch(ctx, EMAIL_KIND, other.kind()),
        }
    }
}

impl AlertFactory for EmailAlertFactory {
    fn kind(&self) -> &'static str {
        EMAIL_KIND
    }

    fn validate(&self, config: &AlertConfig, ctx: &BuildCtx<'_>) -> RuntimeResult<()> {
        // Construction does not touch the network.
        EmailAlert::from_config(Self::config(ctx, config)?).err_conv()?;
        Ok(())
    }

    fn build(
        &self,
        config: &AlertConfig,
        ctx: &BuildCtx<'_>,
    ) -> RuntimeResult<Box<dyn AlertPlugin>> {
        let cfg = Self::config(ctx, config)?;
        let alert = EmailAlert::from_config(cfg)
            .err_conv()?
            .with_span(ctx.alert_span(EMAIL_KIND));
        cm_debug!(
            conf,
            name = ctx.name,
            host = %cfg.host,
            security = %cfg.security,
            auth = cfg.wants_auth(),
            "email alert configured"
        );
        Ok(Box::new(alert))
    }
}

pub struct FileAlertFactory;

impl AlertFactory for FileAlertFactory {
    fn kind(&self) -> &'static str {
        FILE_KIND
    }

    fn validate(&self, config: &AlertConfig, ctx: &BuildCtx<'_>) -> RuntimeResult<()> {
        let AlertConfig::File(cfg) = config else {
            return kind_mismatch(ctx, FILE_KIND, config.kind());
        };
        let path = ctx.resolve(&cfg.path);
        if path.is_dir() {
            return StructError::from(RuntimeReason::Bootstrap)
                .with_detail(format!("alerts.{}: {} is a directory", ctx.name, path.display()))
                .err();
        }
        if !path.exists() && path.parent().is_some_and(|p| !p.exists()) {
            cm_warn!(conf, name = ctx.name, path = %path.display(), "alert file directory will be created");
        }
        Ok(())
    }

    fn build(
        &self,
        config: &AlertConfig,
        ctx: &BuildCtx<'_>,
    ) -> RuntimeResult<Box<dyn AlertPlugin>> {
        let AlertConfig::File(cfg) = config else {
            return kind_mismatch(ctx, FILE_KIND, config.kind());
        };
        let alert = FileAlert::open(ctx.resolve(&cfg.path))
            .err_conv()?
            .with_span(ctx.alert_span(FILE_KIND));
        Ok(Box::new(alert))
    }
}
