use std::sync::Arc;

use interpose_core::{Error, Interceptor, PoolConfig, PoolOverrides, PoolSetup};
use tracing::{debug, trace};

/// Folds every interceptor's pool contribution over `base`.
///
/// Interceptors are consulted in reverse registration order so that the
/// earliest registered one is applied last and wins on a shared setting. A
/// [`PoolSetup::Replace`] short-cuts the fold: its configuration is the
/// result, and every partial override must agree with it.
pub(crate) fn fold_pool_config(
    base: PoolConfig,
    interceptors: &[Arc<dyn Interceptor>],
) -> Result<PoolConfig, Error> {
    let mut folded = base;
    let mut overrides: Vec<PoolOverrides> = Vec::new();
    let mut replacement: Option<PoolConfig> = None;

    for interceptor in interceptors.iter().rev() {
        let current = replacement.as_ref().unwrap_or(&folded);
        match interceptor.configure_pool(current) {
            None => {}
            Some(PoolSetup::Override(partial)) => {
                trace!(interceptor = interceptor.name(), ?partial, "pool override");
                partial.apply_to(&mut folded);
                overrides.push(partial);
            }
            Some(PoolSetup::Replace(config)) => {
                trace!(interceptor = interceptor.name(), ?config, "pool replacement");
                let conflict = replacement
                    .as_ref()
                    .map(|existing| existing.differing_setting(&config));
                match conflict {
                    Some(Some(setting)) => return Err(Error::ConfigurationConflict { setting }),
                    Some(None) => {}
                    None => replacement = Some(config),
                }
            }
        }
    }

    let effective = match replacement {
        Some(config) => {
            if let Some(setting) = overrides
                .iter()
                .find_map(|partial| partial.conflicting_setting(&config))
            {
                return Err(Error::ConfigurationConflict { setting });
            }
            config
        }
        None => folded,
    };
    debug!(?effective, "connection pool configured");
    Ok(effective)
}
