use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Time a navigation call when the `perf_stats` feature is enabled.
///
/// Wraps the function body with a guard that measures wall-clock time and logs
/// `[PERF] <name>: <elapsed>` through Bevy's `info!` when the call takes longer
/// than the threshold. Without `perf_stats` the guard is compiled out entirely.
///
/// The `perf_stats` check is expanded into the *calling* crate, so the feature
/// must be declared there.
///
/// # Example
/// ```ignore
/// #[profile]
/// pub fn find_route(&self, start: &Location, end: &Location) -> Result<Route, InvalidLocation> {
///     // ... search ...
/// }
///
/// #[profile(5)] // only report calls slower than 5ms
/// pub fn build(data: WorldData, config: NavConfig) -> Result<NavWorld, WorldError> { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().trim().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        if elapsed.as_millis() >= #threshold_ms {
                            bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                }
            };

            #block
        }
    };

    output.into()
}
