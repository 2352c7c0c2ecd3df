//! Procedural macros for gherkin-containers
//!
//! - `#[use_container]` - Inject a resource client into a step function

use proc_macro::TokenStream;
use syn::{ItemFn, parse_macro_input};

mod use_container;

/// Inject the client of a resource kind into a step function
///
/// The first parameter of the step must be a `&mut` reference to the
/// scenario context (any type implementing `ContainerWorld`). The parameter
/// named `{kind}_client` is removed from the signature and bound at call
/// time from the context's container manager; its type must be `Arc<T>`
/// where `T` is the plugin's client type.
///
/// The resource is started the first time a step asks for it; later steps of
/// the same scenario receive the same client.
///
/// # Example
///
/// ```ignore
/// use gherkin_containers::{use_container, scenario::ScenarioContext};
///
/// #[use_container("postgres", tag = "16-alpine")]
/// fn a_clean_database(ctx: &mut ScenarioContext, postgres_client: Arc<SqlClient>) {
///     postgres_client.execute("DELETE FROM users", &[]).unwrap();
/// }
///
/// // called without the client:
/// a_clean_database(&mut ctx);
/// ```
///
/// # Arguments
///
/// - a string literal naming the resource kind (required, first)
/// - `key = value` pairs forwarded as creation options
///
/// If the step returns a `Result`, an injection failure is returned through
/// `?`. Otherwise the step panics with the error message.
#[proc_macro_attribute]
pub fn use_container(args: TokenStream, input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as ItemFn);

	use_container::use_container_impl(args.into(), input)
		.unwrap_or_else(|e| e.to_compile_error())
		.into()
}
