// src/zkp/circuit.rs
//! R1CS circuit for credential possession with selective disclosure.
//!
//! Public inputs are allocated in [`SIGNAL_LAYOUT_V1`] order so the prover's
//! public signals line up with what the verifier feeds back in.
//!
//! ## Constraints
//! 1. Every reveal flag is boolean
//! 2. `revealed[i] = attribute[i] * flag[i]`
//! 3. `credential_hash = Poseidon(attributes, issuer_key, schema_hash, Poseidon(user_secret))`
//! 4. `presentation_tag = Poseidon(user_secret, credential_hash, challenge)`
//!
//! Constraint 3 ties the hidden attributes to the hash the issuer attested
//! to. Constraint 4 ties the challenge to the holder's secret without
//! exposing it: the tag is a one-way function of the secret.
//!
//! [`SIGNAL_LAYOUT_V1`]: crate::zkp::attribute_codec::SIGNAL_LAYOUT_V1

use ark_bn254::Fr as Bn254Fr;
use ark_ff::{One, Zero};
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::models::credential::MAX_ATTRIBUTES;
use crate::zkp::poseidon::{
    credential_digest, credential_digest_var, holder_binding, holder_binding_var, presentation_tag,
    presentation_tag_var,
};

/// Circuit assignment. `None` everywhere describes the shape only, for setup.
#[derive(Clone)]
pub struct CredentialCircuit {
    /// Holder secret (private witness)
    pub user_secret: Option<Bn254Fr>,
    /// Padded attribute vector (private witnesses)
    pub attributes: [Option<Bn254Fr>; MAX_ATTRIBUTES],
    /// Reveal bitmask (private witnesses)
    pub flags: [Option<Bn254Fr>; MAX_ATTRIBUTES],

    pub presentation_tag: Option<Bn254Fr>,
    pub revealed: [Option<Bn254Fr>; MAX_ATTRIBUTES],
    pub challenge: Option<Bn254Fr>,
    pub issuer_key: Option<Bn254Fr>,
    pub schema_hash: Option<Bn254Fr>,
    pub credential_hash: Option<Bn254Fr>,
}

impl CredentialCircuit {
    /// Unassigned circuit used for key generation.
    pub fn blank() -> Self {
        CredentialCircuit {
            user_secret: None,
            attributes: [None; MAX_ATTRIBUTES],
            flags: [None; MAX_ATTRIBUTES],
            presentation_tag: None,
            revealed: [None; MAX_ATTRIBUTES],
            challenge: None,
            issuer_key: None,
            schema_hash: None,
            credential_hash: None,
        }
    }

    /// Fully assigned circuit; derives every public output from the private inputs.
    pub fn assign(
        user_secret: Bn254Fr,
        attributes: [Bn254Fr; MAX_ATTRIBUTES],
        flags: [Bn254Fr; MAX_ATTRIBUTES],
        challenge: Bn254Fr,
        issuer_key: Bn254Fr,
        schema_hash: Bn254Fr,
    ) -> Self {
        let credential_hash = credential_digest(&attributes, issuer_key, schema_hash, holder_binding(user_secret));
        let tag = presentation_tag(user_secret, credential_hash, challenge);
        let revealed: [Bn254Fr; MAX_ATTRIBUTES] = std::array::from_fn(|i| attributes[i] * flags[i]);

        CredentialCircuit {
            user_secret: Some(user_secret),
            attributes: attributes.map(Some),
            flags: flags.map(Some),
            presentation_tag: Some(tag),
            revealed: revealed.map(Some),
            challenge: Some(challenge),
            issuer_key: Some(issuer_key),
            schema_hash: Some(schema_hash),
            credential_hash: Some(credential_hash),
        }
    }

    /// Public inputs in allocation order, if the circuit is assigned.
    pub fn public_inputs(&self) -> Option<Vec<Bn254Fr>> {
        let mut inputs = Vec::with_capacity(MAX_ATTRIBUTES + 5);
        inputs.push(self.presentation_tag?);
        for value in &self.revealed {
            inputs.push((*value)?);
        }
        inputs.push(self.challenge?);
        inputs.push(self.issuer_key?);
        inputs.push(self.schema_hash?);
        inputs.push(self.credential_hash?);
        Some(inputs)
    }
}

fn assigned(value: Option<Bn254Fr>) -> impl FnOnce() -> Result<Bn254Fr, SynthesisError> {
    move || value.ok_or(SynthesisError::AssignmentMissing)
}

impl ConstraintSynthesizer<Bn254Fr> for CredentialCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Bn254Fr>) -> Result<(), SynthesisError> {
        // Public inputs first, in layout order
        let tag_var = FpVar::new_input(cs.clone(), assigned(self.presentation_tag))?;
        let revealed_vars = self
            .revealed
            .iter()
            .map(|value| FpVar::new_input(cs.clone(), assigned(*value)))
            .collect::<Result<Vec<_>, _>>()?;
        let challenge_var = FpVar::new_input(cs.clone(), assigned(self.challenge))?;
        let issuer_var = FpVar::new_input(cs.clone(), assigned(self.issuer_key))?;
        let schema_var = FpVar::new_input(cs.clone(), assigned(self.schema_hash))?;
        let hash_var = FpVar::new_input(cs.clone(), assigned(self.credential_hash))?;

        let secret_var = FpVar::new_witness(cs.clone(), assigned(self.user_secret))?;

        let one = FpVar::Constant(Bn254Fr::one());
        let zero = FpVar::Constant(Bn254Fr::zero());

        let mut attribute_vars = Vec::with_capacity(MAX_ATTRIBUTES);
        for i in 0..MAX_ATTRIBUTES {
            let attribute_var = FpVar::new_witness(cs.clone(), assigned(self.attributes[i]))?;
            let flag_var = FpVar::new_witness(cs.clone(), assigned(self.flags[i]))?;

            let not_flag = &flag_var - &one;
            (&flag_var * &not_flag).enforce_equal(&zero)?;
            (&attribute_var * &flag_var).enforce_equal(&revealed_vars[i])?;
            attribute_vars.push(attribute_var);
        }

        let binding_var = holder_binding_var(cs.clone(), &secret_var)?;
        credential_digest_var(cs.clone(), &attribute_vars, &issuer_var, &schema_var, &binding_var)?
            .enforce_equal(&hash_var)?;
        presentation_tag_var(cs, &secret_var, &hash_var, &challenge_var)?.enforce_equal(&tag_var)?;
        Ok(())
    }
}
