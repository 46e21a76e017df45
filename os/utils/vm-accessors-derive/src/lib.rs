//! # Accessor Derive
//!
//! Derive macro for plain configuration structs: one `const` getter and one
//! `const` `with_` builder per named field.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input, spanned::Spanned};

/// Derive to generate `const fn <field>(&self) -> Ty` and
/// `const fn with_<field>(mut self, value: Ty) -> Self` for each **named** field.
///
/// Field types must be `Copy`, since the getter returns by value.
///
/// Skipping a field: `#[accessors(skip)]`
///
/// # Example
///
/// ```
/// use vm_accessors_derive::Accessors;
///
/// #[derive(Accessors, Default)]
/// struct Geometry {
///     frames: usize,
///     levels: u8,
///     #[accessors(skip)]
///     _reserved: (),
/// }
///
/// let g = Geometry::default().with_frames(16).with_levels(2);
/// assert_eq!(g.frames(), 16);
/// assert_eq!(g.levels(), 2);
/// ```
#[proc_macro_derive(Accessors, attributes(accessors))]
pub fn derive_accessors(input: TokenStream) -> TokenStream {
    let DeriveInput {
        ident,
        generics,
        data,
        ..
    } = parse_macro_input!(input as DeriveInput);

    let fields = match data {
        Data::Struct(s) => match s.fields {
            Fields::Named(n) => n.named,
            Fields::Unnamed(u) => {
                return syn::Error::new(u.span(), "Accessors only supports named fields")
                    .to_compile_error()
                    .into();
            }
            Fields::Unit => {
                return syn::Error::new(ident.span(), "Accessors does not apply to unit structs")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new(ident.span(), "Accessors can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut methods = Vec::new();

    for field in fields {
        let Some(fname) = &field.ident else { continue };
        match should_skip(&field.attrs) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => return e.to_compile_error().into(),
        }

        let ty = &field.ty;
        methods.push(quote! {
            #[inline]
            #[must_use]
            pub const fn #fname(&self) -> #ty {
                self.#fname
            }
        });

        let with_name = format_ident!("with_{}", fname);
        methods.push(quote! {
            #[inline]
            #[must_use]
            pub const fn #with_name(mut self, value: #ty) -> Self {
                self.#fname = value;
                self
            }
        });
    }

    let expanded = quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    };

    TokenStream::from(expanded)
}

fn should_skip(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs {
        if !attr.path().is_ident("accessors") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}
