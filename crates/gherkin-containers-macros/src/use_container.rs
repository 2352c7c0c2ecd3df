//! Implementation of the `#[use_container]` macro

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Error, Expr, FnArg, Ident, ItemFn, LitStr, Pat, PatType, Result, ReturnType, Token, Type};

/// `key = value` creation option
struct OptionArg {
	key: Ident,
	value: Expr,
}

impl Parse for OptionArg {
	fn parse(input: ParseStream) -> Result<Self> {
		// keys are option names, so keywords such as `type` are allowed
		let key = Ident::parse_any(input)?;
		input.parse::<Token![=]>()?;
		let value = input.parse()?;
		Ok(Self { key, value })
	}
}

struct UseContainerArgs {
	kind: LitStr,
	options: Vec<OptionArg>,
}

impl Parse for UseContainerArgs {
	fn parse(input: ParseStream) -> Result<Self> {
		if input.is_empty() {
			return Err(input.error(
				"expected a resource kind, e.g. #[use_container(\"postgres\")]",
			));
		}
		let kind: LitStr = input.parse()?;

		let mut options = Vec::new();
		if !input.is_empty() {
			input.parse::<Token![,]>()?;
			options.extend(Punctuated::<OptionArg, Token![,]>::parse_terminated(input)?);
		}

		Ok(Self { kind, options })
	}
}

impl UseContainerArgs {
	fn validate(&self) -> Result<()> {
		let kind = self.kind.value();
		let valid = !kind.is_empty()
			&& !kind.starts_with(|c: char| c.is_ascii_digit())
			&& kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
		if !valid {
			return Err(Error::new_spanned(
				&self.kind,
				"resource kind must be a non-empty identifier (letters, digits, '_')",
			));
		}

		let mut seen: Vec<String> = Vec::new();
		for option in &self.options {
			let key = option.key.unraw().to_string();
			if seen.contains(&key) {
				return Err(Error::new_spanned(
					&option.key,
					format!("duplicate option `{}`", key),
				));
			}
			seen.push(key);
		}
		Ok(())
	}
}

/// Name bound by a simple `name: Type` parameter
fn param_ident(arg: &FnArg) -> Option<&Ident> {
	match arg {
		FnArg::Typed(PatType { pat, .. }) => match pat.as_ref() {
			Pat::Ident(pat_ident) => Some(&pat_ident.ident),
			_ => None,
		},
		FnArg::Receiver(_) => None,
	}
}

/// The scenario context parameter: first, named, and `&mut`
fn context_ident(input: &ItemFn) -> Result<Ident> {
	let error = || {
		Error::new_spanned(
			&input.sig,
			"#[use_container] step functions take the scenario context as `&mut` first parameter",
		)
	};

	let first = input.sig.inputs.first().ok_or_else(error)?;
	let FnArg::Typed(PatType { ty, .. }) = first else {
		return Err(error());
	};
	match ty.as_ref() {
		Type::Reference(reference) if reference.mutability.is_some() => {}
		_ => return Err(error()),
	}
	param_ident(first).cloned().ok_or_else(error)
}

/// `Result<..>`, `io::Result<..>`, `ContainerResult<..>` and the like
fn returns_result(output: &ReturnType) -> bool {
	let ReturnType::Type(_, ty) = output else {
		return false;
	};
	match ty.as_ref() {
		Type::Path(path) => path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.ident.to_string().ends_with("Result")),
		_ => false,
	}
}

/// Implementation of the `#[use_container]` attribute macro
///
/// This macro:
/// 1. Removes the `{kind}_client` parameter from the step signature
/// 2. Binds it at the top of the body through `scenario::inject_client`
pub fn use_container_impl(args: TokenStream, mut input: ItemFn) -> Result<TokenStream> {
	let args: UseContainerArgs = syn::parse2(args)?;
	args.validate()?;

	let kind = &args.kind;
	let client_name = format!("{}_client", kind.value());
	let context = context_ident(&input)?;

	let position = input
		.sig
		.inputs
		.iter()
		.position(|arg| param_ident(arg).is_some_and(|ident| *ident == client_name))
		.ok_or_else(|| {
			Error::new_spanned(
				kind,
				format!("step function has no `{}` parameter", client_name),
			)
		})?;
	if position == 0 {
		return Err(Error::new_spanned(
			&input.sig.inputs[0],
			"the injected client cannot be the scenario context parameter",
		));
	}

	let mut inputs = Punctuated::<FnArg, Token![,]>::new();
	let mut client = None;
	for (index, arg) in std::mem::take(&mut input.sig.inputs).into_iter().enumerate() {
		if index == position {
			client = Some(arg);
		} else {
			inputs.push(arg);
		}
	}
	input.sig.inputs = inputs;

	let Some(FnArg::Typed(PatType { pat, ty, .. })) = client else {
		return Err(Error::new_spanned(&input.sig, "unsupported client parameter"));
	};

	let with_options = args.options.iter().map(|option| {
		let key = option.key.unraw().to_string();
		let value = &option.value;
		quote! { .with(#key, #value) }
	});
	let inject = quote! {
		::gherkin_containers::scenario::inject_client(
			&mut *#context,
			#kind,
			&::gherkin_containers::ContainerOptions::new() #(#with_options)*,
		)
	};

	let binding = if returns_result(&input.sig.output) {
		quote! {
			let #pat: #ty = #inject?;
		}
	} else {
		quote! {
			let #pat: #ty = match #inject {
				::core::result::Result::Ok(client) => client,
				::core::result::Result::Err(error) => ::core::panic!("{}", error),
			};
		}
	};

	let stmts = &input.block.stmts;
	input.block = Box::new(syn::parse_quote!({
		#binding
		#(#stmts)*
	}));

	Ok(quote! { #input })
}

#[cfg(test)]
mod tests {
	use super::*;
	use quote::quote;

	fn expand(args: TokenStream, item: TokenStream) -> Result<String> {
		let item: ItemFn = syn::parse2(item)?;
		use_container_impl(args, item).map(|tokens| tokens.to_string())
	}

	fn expand_err(args: TokenStream, item: TokenStream) -> String {
		match expand(args, item) {
			Ok(tokens) => panic!("expected an error, got {}", tokens),
			Err(e) => e.to_string(),
		}
	}

	#[test]
	fn test_client_parameter_is_removed_and_bound() {
		let expanded = expand(
			quote!("widget"),
			quote! {
				fn step(ctx: &mut Ctx, count: u32, widget_client: Arc<Widget>) {
					widget_client.poke(count);
				}
			},
		)
		.unwrap();

		let signature = expanded.split('{').next().unwrap();
		assert!(signature.contains("count : u32"));
		assert!(!signature.contains("widget_client"));
		assert!(expanded.contains("let widget_client : Arc < Widget >"));
		assert!(expanded.contains("inject_client (& mut * ctx , \"widget\""));
		assert!(expanded.contains("panic !"));
	}

	#[test]
	fn test_options_are_forwarded_in_order() {
		let expanded = expand(
			quote!("postgres", image = "postgres", tag = "16-alpine", r#type = 3),
			quote! {
				fn step(world: &mut World, postgres_client: Arc<Db>) {}
			},
		)
		.unwrap();

		assert!(expanded.contains(
			". with (\"image\" , \"postgres\") . with (\"tag\" , \"16-alpine\") . with (\"type\" , 3)"
		));
	}

	#[test]
	fn test_result_steps_propagate_with_question_mark() {
		let expanded = expand(
			quote!("kafka"),
			quote! {
				fn step(ctx: &mut Ctx, kafka_client: Arc<Kafka>) -> anyhow::Result<()> {
					Ok(())
				}
			},
		)
		.unwrap();

		assert!(expanded.contains(") ? ;"));
		assert!(!expanded.contains("panic !"));
	}

	#[test]
	fn test_missing_client_parameter_is_rejected() {
		let message = expand_err(
			quote!("widget"),
			quote! {
				fn step(ctx: &mut Ctx, gadget_client: Arc<Gadget>) {}
			},
		);
		assert_eq!(message, "step function has no `widget_client` parameter");
	}

	#[test]
	fn test_context_must_be_mutable_reference() {
		let message = expand_err(
			quote!("widget"),
			quote! {
				fn step(ctx: &Ctx, widget_client: Arc<Widget>) {}
			},
		);
		assert!(message.contains("`&mut` first parameter"));
	}

	#[test]
	fn test_missing_kind_is_rejected() {
		let message = expand_err(
			quote!(),
			quote! {
				fn step(ctx: &mut Ctx) {}
			},
		);
		assert!(message.starts_with("expected a resource kind"));
	}

	#[test]
	fn test_invalid_kind_and_duplicate_option() {
		let invalid = expand_err(
			quote!("my-db"),
			quote! {
				fn step(ctx: &mut Ctx) {}
			},
		);
		assert!(invalid.contains("non-empty identifier"));

		let duplicate = expand_err(
			quote!("db", tag = "1", tag = "2"),
			quote! {
				fn step(ctx: &mut Ctx, db_client: Arc<Db>) {}
			},
		);
		assert_eq!(duplicate, "duplicate option `tag`");
	}
}
