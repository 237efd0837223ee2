//! AES-CCM decryption of encrypted advertisement payloads.
//!
//! Every supported encrypted format uses AES-128 in CCM mode with a 4-byte MIC,
//! but the nonce shape differs per protocol version. Each version gets its own
//! [`NonceLayout`] instead of one guessed layout for all.

use crate::mac_address::MacAddress;
use aes::Aes128;
use ccm::Ccm;
use ccm::aead::consts::{U4, U12, U13};
use ccm::aead::generic_array::GenericArray;
use ccm::aead::{Aead, KeyInit, Payload};
use std::collections::HashMap;
use thiserror::Error;

/// AES-CCM message integrity check length in bytes
pub const MIC_LENGTH: usize = 4;

/// Length of the little-endian packet counter that precedes the MIC
pub const COUNTER_LENGTH: usize = 4;

type Ccm12 = Ccm<Aes128, U4, U12>;
type Ccm13 = Ccm<Aes128, U4, U13>;

/// Errors returned by the decryption engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecryptionError {
    #[error("no encryption key configured for {0}")]
    MissingKey(MacAddress),
    #[error("encrypted payload too short: {0} bytes")]
    TooShort(usize),
    #[error("authentication failed for {0}")]
    Authentication(MacAddress),
}

/// Per-device AES keys, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct EncryptionKeys {
    keys: HashMap<MacAddress, [u8; 16]>,
}

impl EncryptionKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mac: MacAddress, key: [u8; 16]) {
        self.keys.insert(mac, key);
    }

    pub fn get(&self, mac: &MacAddress) -> Option<&[u8; 16]> {
        self.keys.get(mac)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(MacAddress, [u8; 16])> for EncryptionKeys {
    fn from_iter<T: IntoIterator<Item = (MacAddress, [u8; 16])>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Nonce construction rule of one encrypted protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceLayout {
    /// BTHome V1: `mac ‖ uuid16 ‖ counter` (12 bytes), associated data `0x11`.
    BtHomeV1 { uuid: u16 },
    /// BTHome V2: `mac ‖ uuid16 ‖ device info ‖ counter` (13 bytes), no
    /// associated data.
    BtHomeV2 { uuid: u16, device_info: u8 },
}

const BTHOME_V1_AAD: &[u8] = &[0x11];

impl NonceLayout {
    pub fn nonce(&self, mac: &MacAddress, counter: &[u8; COUNTER_LENGTH]) -> Vec<u8> {
        let mut nonce = Vec::with_capacity(13);
        nonce.extend_from_slice(&mac.0);
        match self {
            NonceLayout::BtHomeV1 { uuid } => {
                nonce.extend_from_slice(&uuid.to_le_bytes());
            }
            NonceLayout::BtHomeV2 { uuid, device_info } => {
                nonce.extend_from_slice(&uuid.to_le_bytes());
                nonce.push(*device_info);
            }
        }
        nonce.extend_from_slice(counter);
        nonce
    }

    fn aad(&self) -> &'static [u8] {
        match self {
            NonceLayout::BtHomeV1 { .. } => BTHOME_V1_AAD,
            NonceLayout::BtHomeV2 { .. } => &[],
        }
    }
}

/// Plaintext and counter recovered from an encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub plaintext: Vec<u8>,
    pub counter: u32,
}

/// Decrypt `ciphertext ‖ counter ‖ mic` for the device `mac`.
///
/// Nothing of the plaintext is returned unless the MIC verifies.
pub fn decrypt(
    keys: &EncryptionKeys,
    mac: &MacAddress,
    layout: NonceLayout,
    data: &[u8],
) -> Result<Decrypted, DecryptionError> {
    // At least one byte of ciphertext
    if data.len() < 1 + COUNTER_LENGTH + MIC_LENGTH {
        return Err(DecryptionError::TooShort(data.len()));
    }
    let key = keys.get(mac).ok_or(DecryptionError::MissingKey(*mac))?;

    let counter_start = data.len() - MIC_LENGTH - COUNTER_LENGTH;
    let mut counter = [0u8; COUNTER_LENGTH];
    counter.copy_from_slice(&data[counter_start..counter_start + COUNTER_LENGTH]);
    let mic = &data[counter_start + COUNTER_LENGTH..];

    let mut combined = Vec::with_capacity(counter_start + MIC_LENGTH);
    combined.extend_from_slice(&data[..counter_start]);
    combined.extend_from_slice(mic);

    let nonce = layout.nonce(mac, &counter);
    let payload = Payload {
        msg: &combined,
        aad: layout.aad(),
    };
    let key = GenericArray::from_slice(key);

    let plaintext = match layout {
        NonceLayout::BtHomeV1 { .. } => {
            Ccm12::new(key).decrypt(GenericArray::from_slice(&nonce), payload)
        }
        NonceLayout::BtHomeV2 { .. } => {
            Ccm13::new(key).decrypt(GenericArray::from_slice(&nonce), payload)
        }
    }
    .map_err(|_| DecryptionError::Authentication(*mac))?;

    Ok(Decrypted {
        plaintext,
        counter: u32::from_le_bytes(counter),
    })
}

/// Inverse of [`decrypt`], used to build test fixtures.
#[cfg(test)]
pub(crate) fn encrypt(
    key: &[u8; 16],
    mac: &MacAddress,
    layout: NonceLayout,
    counter: u32,
    plaintext: &[u8],
) -> Vec<u8> {
    let counter = counter.to_le_bytes();
    let nonce = layout.nonce(mac, &counter);
    let payload = Payload {
        msg: plaintext,
        aad: layout.aad(),
    };
    let key = GenericArray::from_slice(key);
    let sealed = match layout {
        NonceLayout::BtHomeV1 { .. } => {
            Ccm12::new(key).encrypt(GenericArray::from_slice(&nonce), payload)
        }
        NonceLayout::BtHomeV2 { .. } => {
            Ccm13::new(key).encrypt(GenericArray::from_slice(&nonce), payload)
        }
    }
    .unwrap();

    let (ciphertext, mic) = sealed.split_at(sealed.len() - MIC_LENGTH);
    let mut out = ciphertext.to_vec();
    out.extend_from_slice(&counter);
    out.extend_from_slice(mic);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{BTHOME_KEY, BTHOME_MAC};

    fn keys() -> EncryptionKeys {
        [(BTHOME_MAC, BTHOME_KEY)].into_iter().collect()
    }

    const V1_LAYOUT: NonceLayout = NonceLayout::BtHomeV1 { uuid: 0x181E };
    const V2_LAYOUT: NonceLayout = NonceLayout::BtHomeV2 {
        uuid: 0xFCD2,
        device_info: 0x41,
    };

    #[test]
    fn test_nonce_layouts() {
        let counter = [0x00, 0x11, 0x22, 0x33];
        let v1 = V1_LAYOUT.nonce(&BTHOME_MAC, &counter);
        assert_eq!(hex::encode_upper(&v1), "5448E68F80A51E1800112233");

        let v2 = V2_LAYOUT.nonce(&BTHOME_MAC, &counter);
        assert_eq!(hex::encode_upper(&v2), "5448E68F80A5D2FC4100112233");
    }

    #[test]
    fn test_decrypt_bthome_v1_vector() {
        // Service data of a real BTHome V1 encrypted advertisement, UUID stripped
        let data = hex::decode("fba435e4d3c312fb0011223357d90a99").unwrap();
        let decrypted = decrypt(&keys(), &BTHOME_MAC, V1_LAYOUT, &data).unwrap();
        assert_eq!(hex::encode(&decrypted.plaintext), "2302ca090303bf13");
        assert_eq!(decrypted.counter, 857_870_592);
    }

    #[test]
    fn test_decrypt_bthome_v2_vector() {
        let data = hex::decode("a47266c95f730011223378237214").unwrap();
        let decrypted = decrypt(&keys(), &BTHOME_MAC, V2_LAYOUT, &data).unwrap();
        assert_eq!(hex::encode(&decrypted.plaintext), "02ca0903bf13");
    }

    #[test]
    fn test_encrypt_matches_decrypt() {
        let plaintext = [0x02, 0x00, 0x2A, 0x01, 0x61];
        let sealed = encrypt(&BTHOME_KEY, &BTHOME_MAC, V2_LAYOUT, 7, &plaintext);
        let decrypted = decrypt(&keys(), &BTHOME_MAC, V2_LAYOUT, &sealed).unwrap();
        assert_eq!(decrypted.plaintext, plaintext);
        assert_eq!(decrypted.counter, 7);
    }

    #[test]
    fn test_any_tampered_byte_fails() {
        let data = hex::decode("fba435e4d3c312fb0011223357d90a99").unwrap();
        for i in 0..data.len() {
            let mut tampered = data.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                decrypt(&keys(), &BTHOME_MAC, V1_LAYOUT, &tampered),
                Err(DecryptionError::Authentication(BTHOME_MAC)),
                "byte {i} tampered"
            );
        }
    }

    #[test]
    fn test_wrong_layout_fails() {
        let data = hex::decode("fba435e4d3c312fb0011223357d90a99").unwrap();
        assert!(decrypt(&keys(), &BTHOME_MAC, V2_LAYOUT, &data).is_err());
    }

    #[test]
    fn test_missing_key() {
        let data = hex::decode("fba435e4d3c312fb0011223357d90a99").unwrap();
        let other = MacAddress([1, 2, 3, 4, 5, 6]);
        assert_eq!(
            decrypt(&keys(), &other, V1_LAYOUT, &data),
            Err(DecryptionError::MissingKey(other))
        );
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            decrypt(&keys(), &BTHOME_MAC, V1_LAYOUT, &[0u8; 8]),
            Err(DecryptionError::TooShort(8))
        );
    }
}
