pub mod detect;
pub mod keygen;
pub mod mark;
pub mod status;

use std::path::PathBuf;

use sello_key::KeyMaterial;

/// Resolve key material from explicit flags, falling back to the
/// environment. No private key at all yields `None`, which downstream
/// selects the simulated signer.
pub fn resolve_material(
    key: Option<String>,
    certificate: Option<String>,
) -> Option<KeyMaterial> {
    let env = KeyMaterial::from_env();
    let private_key_path = key.map(PathBuf::from).or(env.private_key_path);
    let certificate_path = certificate.map(PathBuf::from).or(env.certificate_path);
    private_key_path
        .is_some()
        .then(|| KeyMaterial::new(private_key_path, certificate_path))
}
