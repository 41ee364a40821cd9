// src/zkp/poseidon.rs
//! Poseidon hashing over BN254, natively and as an R1CS gadget.
//!
//! The issuer computes credential hashes off-circuit and the credential
//! circuit recomputes them in-circuit; both sides share one parameter set.
//!
//! ## Parameters
//! - Full rounds: 8
//! - Partial rounds: 57
//! - Alpha (S-box): 5
//! - Rate: 2, capacity: 1
//! - Round constants and MDS matrix drawn from the Grain LFSR
//!
//! ## Digests
//! Every digest absorbs a domain tag first.
//! - holder binding: `H(1, user_secret)`
//! - credential hash: `H(2, attribute[0..10], issuer_key, schema_hash, holder_binding)`
//! - presentation tag: `H(3, user_secret, credential_hash, challenge)`

use ark_bn254::Fr as Bn254Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use once_cell::sync::Lazy;

use crate::errors::CodecError;
use crate::models::credential::MAX_ATTRIBUTES;
use crate::utils::crypto::issuer_key_field;
use crate::utils::serialization::{decimal_to_fr, fr_to_decimal};
use crate::zkp::attribute_codec::pad_attributes;

const FULL_ROUNDS: usize = 8;
const PARTIAL_ROUNDS: usize = 57;
const ALPHA: u64 = 5;
const RATE: usize = 2;
const CAPACITY: usize = 1;

const HOLDER_DOMAIN: u64 = 1;
const CREDENTIAL_DOMAIN: u64 = 2;
const PRESENTATION_DOMAIN: u64 = 3;

static POSEIDON_CONFIG: Lazy<PoseidonConfig<Bn254Fr>> = Lazy::new(|| {
    let (ark, mds) = find_poseidon_ark_and_mds::<Bn254Fr>(
        u64::from(Bn254Fr::MODULUS_BIT_SIZE),
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );
    PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
});

fn config() -> &'static PoseidonConfig<Bn254Fr> {
    &POSEIDON_CONFIG
}

/// Hashes `inputs` to a single field element.
pub fn poseidon_hash(inputs: &[Bn254Fr]) -> Bn254Fr {
    let mut sponge = PoseidonSponge::<Bn254Fr>::new(config());
    sponge.absorb(&inputs);
    sponge.squeeze_native_field_elements(1)[0]
}

/// In-circuit counterpart of [`poseidon_hash`].
pub fn poseidon_hash_var(
    cs: ConstraintSystemRef<Bn254Fr>,
    inputs: &[FpVar<Bn254Fr>],
) -> Result<FpVar<Bn254Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Bn254Fr>::new(cs, config());
    sponge.absorb(&inputs)?;
    sponge
        .squeeze_field_elements(1)?
        .pop()
        .ok_or(SynthesisError::Unsatisfiable)
}

fn tag(domain: u64) -> FpVar<Bn254Fr> {
    FpVar::Constant(Bn254Fr::from(domain))
}

pub fn holder_binding(user_secret: Bn254Fr) -> Bn254Fr {
    poseidon_hash(&[Bn254Fr::from(HOLDER_DOMAIN), user_secret])
}

pub fn credential_digest(
    attributes: &[Bn254Fr; MAX_ATTRIBUTES],
    issuer_key: Bn254Fr,
    schema_hash: Bn254Fr,
    holder_binding: Bn254Fr,
) -> Bn254Fr {
    let mut inputs = Vec::with_capacity(MAX_ATTRIBUTES + 4);
    inputs.push(Bn254Fr::from(CREDENTIAL_DOMAIN));
    inputs.extend_from_slice(attributes);
    inputs.extend([issuer_key, schema_hash, holder_binding]);
    poseidon_hash(&inputs)
}

pub fn presentation_tag(user_secret: Bn254Fr, credential_hash: Bn254Fr, challenge: Bn254Fr) -> Bn254Fr {
    poseidon_hash(&[Bn254Fr::from(PRESENTATION_DOMAIN), user_secret, credential_hash, challenge])
}

pub fn holder_binding_var(
    cs: ConstraintSystemRef<Bn254Fr>,
    user_secret: &FpVar<Bn254Fr>,
) -> Result<FpVar<Bn254Fr>, SynthesisError> {
    poseidon_hash_var(cs, &[tag(HOLDER_DOMAIN), user_secret.clone()])
}

pub fn credential_digest_var(
    cs: ConstraintSystemRef<Bn254Fr>,
    attributes: &[FpVar<Bn254Fr>],
    issuer_key: &FpVar<Bn254Fr>,
    schema_hash: &FpVar<Bn254Fr>,
    holder_binding: &FpVar<Bn254Fr>,
) -> Result<FpVar<Bn254Fr>, SynthesisError> {
    let mut inputs = Vec::with_capacity(attributes.len() + 4);
    inputs.push(tag(CREDENTIAL_DOMAIN));
    inputs.extend_from_slice(attributes);
    inputs.extend([issuer_key.clone(), schema_hash.clone(), holder_binding.clone()]);
    poseidon_hash_var(cs, &inputs)
}

pub fn presentation_tag_var(
    cs: ConstraintSystemRef<Bn254Fr>,
    user_secret: &FpVar<Bn254Fr>,
    credential_hash: &FpVar<Bn254Fr>,
    challenge: &FpVar<Bn254Fr>,
) -> Result<FpVar<Bn254Fr>, SynthesisError> {
    poseidon_hash_var(
        cs,
        &[
            tag(PRESENTATION_DOMAIN),
            user_secret.clone(),
            credential_hash.clone(),
            challenge.clone(),
        ],
    )
}

/// The hash an issuer attests to for a credential, from its decimal fields.
///
/// The holder's secret enters only through its binding, so the issuer can
/// compute this from the binding alone; the secret itself is not retained.
///
/// # Errors
/// [`CodecError`] for more than 10 attributes or a non-field value.
pub fn credential_hash(
    user_secret: &str,
    attributes: &[String],
    issuer_public_key: &str,
    schema_hash: &str,
) -> Result<String, CodecError> {
    let padded = pad_attributes(attributes)?;
    let mut values = [Bn254Fr::from(0u64); MAX_ATTRIBUTES];
    for (slot, value) in values.iter_mut().zip(&padded) {
        *slot = decimal_to_fr(value)?;
    }
    let digest = credential_digest(
        &values,
        issuer_key_field(issuer_public_key),
        decimal_to_fr(schema_hash)?,
        holder_binding(decimal_to_fr(user_secret)?),
    );
    Ok(fr_to_decimal(&digest))
}
