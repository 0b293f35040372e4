//! Procedural macros for consensus encoding and decoding.
//!
//! The generated impls refer to `crate::chain::consensus` and `crate::chain::io`,
//! so the derive is meant to be used from inside `litecore-common`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives `Encodable` and `Decodable` for a fixed-layout record.
///
/// Fields are written and read in declaration order with no framing, which is
/// exactly what the 80-byte header preimage needs.
///
/// # Example
///
/// ```ignore
/// use litecore_derive::ConsensusCodec;
///
/// #[derive(ConsensusCodec)]
/// struct HeaderFields {
///     version: u32,
///     prev_block: [u8; 32],
///     merkle_root: [u8; 32],
///     time: u32,
///     bits: u32,
///     nonce: u32,
/// }
/// ```
#[proc_macro_derive(ConsensusCodec)]
pub fn derive_consensus_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unnamed(fields) => &fields.unnamed,
            Fields::Unit => {
                return syn::Error::new_spanned(
                    &input,
                    "ConsensusCodec cannot be derived for unit structs",
                )
                .to_compile_error()
                .into();
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            return syn::Error::new_spanned(&input, "ConsensusCodec can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let field_accesses: Vec<_> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| match &field.ident {
            Some(ident) => quote! { self.#ident },
            None => {
                let index = syn::Index::from(i);
                quote! { self.#index }
            }
        })
        .collect();

    let field_constructions: Vec<_> = fields
        .iter()
        .map(|field| {
            let decode = quote! {
                crate::chain::consensus::Decodable::consensus_decode_from_finite_reader(reader)?
            };
            match &field.ident {
                Some(ident) => quote! { #ident: #decode },
                None => decode,
            }
        })
        .collect();

    let constructor = if fields.iter().any(|f| f.ident.is_some()) {
        quote! { #name { #(#field_constructions),* } }
    } else {
        quote! { #name(#(#field_constructions),*) }
    };

    let expanded = quote! {
        impl #impl_generics crate::chain::consensus::Encodable for #name #ty_generics #where_clause {
            #[inline]
            fn consensus_encode<W: crate::chain::io::Write + ?Sized>(
                &self,
                writer: &mut W,
            ) -> core::result::Result<usize, crate::chain::io::Error> {
                let mut len: usize = 0;
                #(
                    len = len.saturating_add(
                        crate::chain::consensus::Encodable::consensus_encode(&#field_accesses, writer)?,
                    );
                )*
                Ok(len)
            }
        }

        impl #impl_generics crate::chain::consensus::Decodable for #name #ty_generics #where_clause {
            #[inline]
            fn consensus_decode_from_finite_reader<R: crate::chain::io::Read + ?Sized>(
                reader: &mut R,
            ) -> core::result::Result<Self, crate::chain::consensus::EncodeDecodeError> {
                Ok(#constructor)
            }
        }
    };

    TokenStream::from(expanded)
}
