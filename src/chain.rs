use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use halo2_proofs::{
    plonk::{
        create_proof, keygen_pk, keygen_vk, verify_proof, Circuit, ProvingKey, VerifyingKey,
    },
    poly::{
        commitment::{Params, ParamsProver},
        kzg::{
            commitment::{KZGCommitmentScheme, ParamsKZG},
            multiopen::{ProverGWC, VerifierGWC},
            strategy::AccumulatorStrategy,
        },
        VerificationStrategy,
    },
    transcript::{
        Blake2bRead, Blake2bWrite, Challenge255, TranscriptReadBuffer, TranscriptWriterBuffer,
    },
};
use halo2curves::bn256::{Bn256, Fr, G1Affine};
use log::{debug, info, warn};
use rand_core::OsRng;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{
    circuit::{BaseCaseCircuit, StepCaseCircuit},
    witness_gen::{limbs::ReductionPair, trace_gen::euclid},
    Error, NUM_LIMBS, STEPS_PER_PROOF,
};

/// One proof of the chain and the transition it declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link<const L: usize = NUM_LIMBS> {
    pub input: ReductionPair<L>,
    pub output: ReductionPair<L>,
    pub proof: Vec<u8>,
}

/// Evidence that `output` is reached from `input` by repeated Euclid steps.
///
/// The first link is a base case proof; every later link is a step case
/// proof whose prior output is the previous link's output, so an attestation
/// is self-contained and the newest one subsumes all earlier ones.
///
/// Never empty; deserializing an empty link list fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attestation<const L: usize = NUM_LIMBS> {
    links: Vec<Link<L>>,
}

impl<'de, const L: usize> Deserialize<'de> for Attestation<L> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Links<const N: usize> {
            links: Vec<Link<N>>,
        }

        let Links { links } = Links::<L>::deserialize(deserializer)?;
        if links.is_empty() {
            return Err(de::Error::custom("attestation has no links"));
        }
        Ok(Self { links })
    }
}

impl<const L: usize> Attestation<L> {
    pub fn input(&self) -> &ReductionPair<L> {
        &self.head().input
    }

    pub fn output(&self) -> &ReductionPair<L> {
        &self.tail().output
    }

    pub fn links(&self) -> &[Link<L>] {
        &self.links
    }

    /// The attestation this one extends, if it is not a base case.
    pub fn prior(&self) -> Option<Attestation<L>> {
        match self.links.len() {
            0 | 1 => None,
            n => Some(Self {
                links: self.links[..n - 1].to_vec(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    fn head(&self) -> &Link<L> {
        &self.links[0]
    }

    fn tail(&self) -> &Link<L> {
        &self.links[self.links.len() - 1]
    }
}

/// KZG parameters and the proving keys of both relations.
///
/// Built once and only read afterwards, so independent chains can share one
/// instance across threads.
pub struct ChainKeys<const L: usize = NUM_LIMBS, const STEPS: usize = STEPS_PER_PROOF> {
    params: ParamsKZG<Bn256>,
    base_pk: ProvingKey<G1Affine>,
    step_pk: ProvingKey<G1Affine>,
    verified: AtomicUsize,
}

impl<const L: usize, const STEPS: usize> ChainKeys<L, STEPS> {
    /// Fresh parameters for `2^k` rows. Only suitable for testing: the
    /// toxic waste comes from this process.
    pub fn new(k: u32) -> Result<Self, Error> {
        Self::compile(ParamsKZG::<Bn256>::new(k))
    }

    /// Loads parameters from `cache`, or generates and stores them when the
    /// file is missing, has another size, or `force` is set.
    pub fn setup(k: u32, cache: &Path, force: bool) -> Result<Self, Error> {
        if cache.exists() && !force {
            let params = ParamsKZG::<Bn256>::read(&mut BufReader::new(File::open(cache)?))?;
            if params.k() == k {
                debug!("loaded parameters from {}", cache.display());
                return Self::compile(params);
            }
            warn!(
                "{} holds parameters for k = {}, regenerating for k = {}",
                cache.display(),
                params.k(),
                k
            );
        }

        let params = ParamsKZG::<Bn256>::new(k);
        let mut writer = BufWriter::new(File::create(cache)?);
        params.write(&mut writer)?;
        writer.flush()?;
        debug!("wrote parameters to {}", cache.display());
        Self::compile(params)
    }

    pub fn compile(params: ParamsKZG<Bn256>) -> Result<Self, Error> {
        let base = BaseCaseCircuit::<L, STEPS>::default();
        let vk = keygen_vk(&params, &base)?;
        let base_pk = keygen_pk(&params, vk, &base)?;

        let step = StepCaseCircuit::<L, STEPS>::default();
        let vk = keygen_vk(&params, &step)?;
        let step_pk = keygen_pk(&params, vk, &step)?;

        info!("compiled relations, k = {}", params.k());
        Ok(Self {
            params,
            base_pk,
            step_pk,
            verified: AtomicUsize::new(0),
        })
    }

    pub fn params(&self) -> &ParamsKZG<Bn256> {
        &self.params
    }

    /// Number of proofs checked by these keys so far.
    pub fn verified_proofs(&self) -> usize {
        self.verified.load(Ordering::Relaxed)
    }

    pub fn prove_base(&self, input: &ReductionPair<L>) -> Result<Attestation<L>, Error> {
        let output = euclid(input, STEPS);
        let instance = BaseCaseCircuit::<L, STEPS>::instance::<Fr>(input, &output);

        let proof = self.prove(&self.base_pk, BaseCaseCircuit::<L, STEPS>::new(*input), &instance)?;
        if !self.check(self.base_pk.get_vk(), &proof, &instance) {
            return Err(Error::Unsatisfied {
                relation: "base case",
                input: input.to_string(),
            });
        }
        debug!("base case {} -> {}", input, output);

        Ok(Attestation {
            links: vec![Link {
                input: *input,
                output,
                proof,
            }],
        })
    }

    /// Extends `prior` by `STEPS` reductions of its output.
    ///
    /// `prior` is verified first, one proof per link, and `input` must be the
    /// input it started from.
    pub fn prove_step(
        &self,
        prior: &Attestation<L>,
        input: &ReductionPair<L>,
    ) -> Result<Attestation<L>, Error> {
        self.verify(prior)?;
        if prior.input() != input {
            return Err(Error::ContinuityMismatch {
                expected: prior.input().to_string(),
                found: input.to_string(),
            });
        }
        self.extend(prior.clone())
    }

    /// Appends a step case proof to an attestation whose links were all
    /// checked when they were proven.
    fn extend(&self, mut attestation: Attestation<L>) -> Result<Attestation<L>, Error> {
        let input = *attestation.input();
        let prior_output = *attestation.output();
        let output = euclid(&prior_output, STEPS);
        let instance = StepCaseCircuit::<L, STEPS>::instance::<Fr>(&input, &prior_output, &output);

        let circuit = StepCaseCircuit::<L, STEPS>::new(input, prior_output);
        let proof = self.prove(&self.step_pk, circuit, &instance)?;
        if !self.check(self.step_pk.get_vk(), &proof, &instance) {
            return Err(Error::Unsatisfied {
                relation: "step case",
                input: prior_output.to_string(),
            });
        }
        debug!("step case {} -> {}", prior_output, output);

        attestation.links.push(Link {
            input,
            output,
            proof,
        });
        Ok(attestation)
    }

    /// Checks every link, oldest first. Fails with the index of the first
    /// link that does not verify or does not continue its predecessor.
    pub fn verify(&self, attestation: &Attestation<L>) -> Result<(), Error> {
        let mut prior: Option<&Link<L>> = None;
        for (index, link) in attestation.links.iter().enumerate() {
            let accepted = match prior {
                None => {
                    let instance =
                        BaseCaseCircuit::<L, STEPS>::instance::<Fr>(&link.input, &link.output);
                    self.check(self.base_pk.get_vk(), &link.proof, &instance)
                }
                Some(prior) => {
                    let instance = StepCaseCircuit::<L, STEPS>::instance::<Fr>(
                        &link.input,
                        &prior.output,
                        &link.output,
                    );
                    prior.input == link.input
                        && self.check(self.step_pk.get_vk(), &link.proof, &instance)
                }
            };
            if !accepted {
                return Err(Error::Verification { link: index });
            }
            prior = Some(link);
        }
        Ok(())
    }

    /// Base case, then step cases until the output is solved. Each proof is
    /// checked once, when it is made.
    pub fn solve(&self, input: &ReductionPair<L>) -> Result<Attestation<L>, Error> {
        let mut attestation = self.prove_base(input)?;
        info!("link 0: {}", attestation.output());
        while !attestation.output().is_solved() {
            attestation = self.extend(attestation)?;
            info!("link {}: {}", attestation.links.len() - 1, attestation.output());
        }
        Ok(attestation)
    }

    fn prove<C: Circuit<Fr>>(
        &self,
        pk: &ProvingKey<G1Affine>,
        circuit: C,
        instance: &[Fr],
    ) -> Result<Vec<u8>, Error> {
        let mut transcript = Blake2bWrite::<_, G1Affine, Challenge255<_>>::init(vec![]);
        create_proof::<KZGCommitmentScheme<_>, ProverGWC<'_, _>, _, _, _, _>(
            &self.params,
            pk,
            &[circuit],
            &[&[instance]],
            OsRng,
            &mut transcript,
        )?;
        Ok(transcript.finalize())
    }

    fn check(&self, vk: &VerifyingKey<G1Affine>, proof: &[u8], instance: &[Fr]) -> bool {
        self.verified.fetch_add(1, Ordering::Relaxed);
        let params = self.params.verifier_params();
        let mut transcript = Blake2bRead::<_, G1Affine, Challenge255<_>>::init(proof);
        let strategy = AccumulatorStrategy::new(params);
        verify_proof::<
            KZGCommitmentScheme<Bn256>,
            VerifierGWC<'_, Bn256>,
            Challenge255<G1Affine>,
            Blake2bRead<&[u8], G1Affine, Challenge255<G1Affine>>,
            AccumulatorStrategy<'_, Bn256>,
        >(params, vk, strategy, &[&[instance]], &mut transcript)
        .map(|strategy| strategy.finalize())
        .unwrap_or(false)
    }
}
