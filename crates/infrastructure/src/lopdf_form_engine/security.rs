//! Standard security handler, opened with the blank user password.
//!
//! Supports RC4 (`/V 1, 2`), RC4 or AES-128 crypt filters (`/V 4`) and
//! AES-256 (`/V 5`, revisions 5 and 6). Every string and stream in the object
//! graph is decrypted, including strings nested inside dictionaries and arrays.

use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use lopdf::{Dictionary, Document, Object, ObjectId};
use md5::{Digest, Md5};
use prcard_core::{AppError, AppResult};
use rc4::consts::{U5, U6, U7, U8, U9, U10, U11, U12, U13, U14, U15, U16};
use rc4::{KeyInit, Rc4, StreamCipher};
use sha2::{Sha256, Sha384, Sha512};
use tracing::debug;

/// Pads passwords for revisions 2 to 4.
pub(super) const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

const AES_BLOCK: usize = 16;

/// Cipher applied to one class of objects (strings or streams).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cipher {
    Identity,
    Rc4,
    Aes128,
    Aes256,
}

impl Cipher {
    fn from_filter(name: &[u8]) -> AppResult<Self> {
        match name {
            b"None" | b"Identity" => Ok(Self::Identity),
            b"V2" => Ok(Self::Rc4),
            b"AESV2" => Ok(Self::Aes128),
            b"AESV3" => Ok(Self::Aes256),
            other => Err(unsupported(&format!(
                "crypt filter method /{}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Decrypts `data` belonging to indirect object `id`.
    fn decrypt(self, file_key: &[u8], id: ObjectId, data: &[u8]) -> AppResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            Self::Rc4 => rc4(&object_key(file_key, id, false), data),
            Self::Aes128 => aes_cbc_decrypt(&object_key(file_key, id, true), data),
            Self::Aes256 => aes_cbc_decrypt(file_key, data),
        }
    }
}

/// Encryption parameters read from the `/Encrypt` dictionary.
struct Handler {
    revision: i64,
    key_length: usize,
    owner: Vec<u8>,
    user: Vec<u8>,
    user_key: Vec<u8>,
    permissions: i64,
    encrypt_metadata: bool,
    strings: Cipher,
    streams: Cipher,
}

/// Decrypts every object of an encrypted document in place and removes the
/// `/Encrypt` entry. Documents that need a non-blank password fail with
/// `AppError::Validation`.
pub(super) fn decrypt_document(document: &mut Document) -> AppResult<()> {
    let encrypt_id = document.trailer.get(b"Encrypt").and_then(Object::as_reference).ok();
    let encrypt = encrypt_dictionary(document)?;
    let handler = Handler::parse(&encrypt)?;
    let first_id = document_id(document);
    let file_key = handler.authenticate_blank_user(&first_id)?;

    for (&id, object) in &mut document.objects {
        if Some(id) == encrypt_id {
            continue;
        }
        decrypt_object(object, id, &file_key, &handler)?;
    }

    if let Some(id) = encrypt_id {
        document.objects.remove(&id);
    }
    document.trailer.remove(b"Encrypt");
    debug!(
        revision = handler.revision,
        strings = ?handler.strings,
        streams = ?handler.streams,
        "decrypted document with blank password"
    );
    Ok(())
}

fn encrypt_dictionary(document: &Document) -> AppResult<Dictionary> {
    let object = document
        .trailer
        .get(b"Encrypt")
        .map_err(|_| unsupported("missing /Encrypt dictionary"))?;
    let object = match object {
        Object::Reference(id) => document
            .get_object(*id)
            .map_err(|_| unsupported("dangling /Encrypt reference"))?,
        other => other,
    };
    object
        .as_dict()
        .cloned()
        .map_err(|_| unsupported("/Encrypt is not a dictionary"))
}

fn document_id(document: &Document) -> Vec<u8> {
    match document.trailer.get(b"ID") {
        Ok(Object::Array(items)) => match items.first() {
            Some(Object::String(bytes, _)) => bytes.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn integer(dictionary: &Dictionary, key: &[u8]) -> Option<i64> {
    dictionary.get(key).and_then(Object::as_i64).ok()
}

fn bytes(dictionary: &Dictionary, key: &[u8]) -> Vec<u8> {
    match dictionary.get(key) {
        Ok(Object::String(bytes, _)) => bytes.clone(),
        _ => Vec::new(),
    }
}

impl Handler {
    fn parse(encrypt: &Dictionary) -> AppResult<Self> {
        let filter = encrypt
            .get(b"Filter")
            .and_then(Object::as_name)
            .unwrap_or_default();
        if filter != b"Standard" {
            return Err(unsupported(&format!(
                "security handler /{}",
                String::from_utf8_lossy(filter)
            )));
        }

        let version = integer(encrypt, b"V").unwrap_or(0);
        let revision = integer(encrypt, b"R").unwrap_or(0);
        let (strings, streams, key_length) = match version {
            1 => (Cipher::Rc4, Cipher::Rc4, 5),
            2 | 3 => {
                let bits = integer(encrypt, b"Length").unwrap_or(40);
                (Cipher::Rc4, Cipher::Rc4, key_length_from_bits(bits)?)
            }
            4 => (
                crypt_filter(encrypt, b"StrF")?,
                crypt_filter(encrypt, b"StmF")?,
                16,
            ),
            5 => (
                crypt_filter(encrypt, b"StrF")?,
                crypt_filter(encrypt, b"StmF")?,
                32,
            ),
            other => return Err(unsupported(&format!("encryption version {other}"))),
        };
        if !(2..=6).contains(&revision) {
            return Err(unsupported(&format!("security handler revision {revision}")));
        }

        Ok(Self {
            revision,
            key_length,
            owner: bytes(encrypt, b"O"),
            user: bytes(encrypt, b"U"),
            user_key: bytes(encrypt, b"UE"),
            permissions: integer(encrypt, b"P").unwrap_or(0),
            encrypt_metadata: encrypt
                .get(b"EncryptMetadata")
                .and_then(Object::as_bool)
                .unwrap_or(true),
            strings,
            streams,
        })
    }

    /// Derives the file key from the blank user password, verifying it
    /// against `/U`.
    fn authenticate_blank_user(&self, first_id: &[u8]) -> AppResult<Vec<u8>> {
        let key = if self.revision >= 5 {
            self.modern_file_key()?
        } else {
            let key = legacy_file_key(
                self.revision,
                self.key_length,
                &self.owner,
                self.permissions,
                first_id,
                self.encrypt_metadata,
            );
            let expected = legacy_user_entry(self.revision, &key, first_id)?;
            let compared = if self.revision == 2 { 32 } else { 16 };
            if self.user.len() < compared || self.user[..compared] != expected[..compared] {
                return Err(password_required());
            }
            key
        };
        Ok(key)
    }

    fn modern_file_key(&self) -> AppResult<Vec<u8>> {
        if self.user.len() < 48 || self.user_key.len() < 32 {
            return Err(unsupported("truncated /U or /UE entry"));
        }
        let (hash, salts) = self.user.split_at(32);
        let (validation_salt, key_salt) = salts.split_at(8);
        let key_salt = &key_salt[..8];

        if self.revision_hash(validation_salt)? != hash {
            return Err(password_required());
        }
        let intermediate = self.revision_hash(key_salt)?;

        cbc::Decryptor::<Aes256>::new_from_slices(&intermediate, &[0; AES_BLOCK])
            .map_err(|error| AppError::Internal(format!("invalid AES-256 key: {error}")))?
            .decrypt_padded_vec_mut::<NoPadding>(&self.user_key[..32])
            .map_err(|_| AppError::Validation("document has a corrupt /UE entry".to_owned()))
    }

    /// Password hash of revision 5 (plain SHA-256) or 6 (hardened).
    fn revision_hash(&self, salt: &[u8]) -> AppResult<Vec<u8>> {
        if self.revision == 5 {
            return Ok(Sha256::digest(salt).to_vec());
        }
        hardened_hash(b"", salt, &[])
    }
}

fn key_length_from_bits(bits: i64) -> AppResult<usize> {
    if !(40..=128).contains(&bits) || bits % 8 != 0 {
        return Err(unsupported(&format!("key length {bits}")));
    }
    usize::try_from(bits / 8).map_err(|_| unsupported(&format!("key length {bits}")))
}

fn crypt_filter(encrypt: &Dictionary, key: &[u8]) -> AppResult<Cipher> {
    let name = encrypt
        .get(key)
        .and_then(Object::as_name)
        .unwrap_or(b"Identity".as_slice());
    if name == b"Identity" {
        return Ok(Cipher::Identity);
    }
    let method = encrypt
        .get(b"CF")
        .and_then(Object::as_dict)
        .and_then(|filters| filters.get(name))
        .and_then(Object::as_dict)
        .and_then(|filter| filter.get(b"CFM"))
        .and_then(Object::as_name)
        .unwrap_or(b"None".as_slice());
    Cipher::from_filter(method)
}

/// File key for revisions 2 to 4 (blank password).
pub(super) fn legacy_file_key(
    revision: i64,
    key_length: usize,
    owner: &[u8],
    permissions: i64,
    first_id: &[u8],
    encrypt_metadata: bool,
) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(PASSWORD_PADDING);
    hasher.update(owner);
    hasher.update((permissions as u32).to_le_bytes());
    hasher.update(first_id);
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF; 4]);
    }
    let mut hash = hasher.finalize().to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_length]).to_vec();
        }
    }
    hash.truncate(key_length);
    hash
}

/// Expected `/U` value for the blank password, revisions 2 to 4.
pub(super) fn legacy_user_entry(revision: i64, key: &[u8], first_id: &[u8]) -> AppResult<Vec<u8>> {
    if revision == 2 {
        return rc4(key, &PASSWORD_PADDING);
    }

    let mut hasher = Md5::new();
    hasher.update(PASSWORD_PADDING);
    hasher.update(first_id);
    let mut entry = rc4(key, &hasher.finalize())?;
    for round in 1..=19_u8 {
        let round_key: Vec<u8> = key.iter().map(|byte| byte ^ round).collect();
        entry = rc4(&round_key, &entry)?;
    }
    entry.resize(32, 0);
    Ok(entry)
}

/// Revision 6 password hash: SHA-2 rounds keyed through AES-128-CBC.
fn hardened_hash(password: &[u8], salt: &[u8], user_entry: &[u8]) -> AppResult<Vec<u8>> {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(user_entry);
    let mut key = hasher.finalize().to_vec();

    let mut round = 0_usize;
    loop {
        let block: Vec<u8> = [password, key.as_slice(), user_entry].concat();
        let repeated = block.repeat(64);
        let encrypted = cbc::Encryptor::<Aes128>::new_from_slices(&key[..16], &key[16..32])
            .map_err(|error| AppError::Internal(format!("invalid AES-128 key: {error}")))?
            .encrypt_padded_vec_mut::<NoPadding>(&repeated);

        let selector = encrypted[..16]
            .iter()
            .map(|byte| u32::from(*byte))
            .sum::<u32>()
            % 3;
        key = match selector {
            0 => Sha256::digest(&encrypted).to_vec(),
            1 => Sha384::digest(&encrypted).to_vec(),
            _ => Sha512::digest(&encrypted).to_vec(),
        };

        round += 1;
        let last = encrypted.last().copied().map_or(0, usize::from);
        if round >= 64 && last + 32 <= round {
            break;
        }
    }

    key.truncate(32);
    Ok(key)
}

/// Per-object key for RC4 and AES-128 (`sAlT` suffix).
pub(super) fn object_key(file_key: &[u8], id: ObjectId, aes: bool) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&id.0.to_le_bytes()[..3]);
    hasher.update(id.1.to_le_bytes());
    if aes {
        hasher.update(b"sAlT");
    }
    let mut key = hasher.finalize().to_vec();
    key.truncate((file_key.len() + 5).min(16));
    key
}

fn decrypt_object(
    object: &mut Object,
    id: ObjectId,
    file_key: &[u8],
    handler: &Handler,
) -> AppResult<()> {
    match object {
        Object::String(bytes, _) => {
            *bytes = handler.strings.decrypt(file_key, id, bytes)?;
        }
        Object::Array(items) => {
            for item in items {
                decrypt_object(item, id, file_key, handler)?;
            }
        }
        Object::Dictionary(dictionary) => {
            for (_, value) in dictionary.iter_mut() {
                decrypt_object(value, id, file_key, handler)?;
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                decrypt_object(value, id, file_key, handler)?;
            }
            let kind = stream.dict.get(b"Type").and_then(Object::as_name).ok();
            let plain_metadata = !handler.encrypt_metadata && kind == Some(b"Metadata".as_slice());
            if kind != Some(b"XRef".as_slice()) && !plain_metadata {
                let content = handler.streams.decrypt(file_key, id, &stream.content)?;
                stream.set_content(content);
            }
        }
        _ => {}
    }
    Ok(())
}

/// RC4 keystream applied to `data`; keys are 5 to 16 bytes.
pub(super) fn rc4(key: &[u8], data: &[u8]) -> AppResult<Vec<u8>> {
    let mut output = data.to_vec();

    macro_rules! apply {
        ($($length:literal => $size:ty),+ $(,)?) => {
            match key.len() {
                $($length => Rc4::<$size>::new_from_slice(key)
                    .map(|mut cipher| cipher.apply_keystream(&mut output))
                    .map_err(|error| AppError::Internal(format!("invalid RC4 key: {error}")))?,)+
                other => return Err(unsupported(&format!("RC4 key of {other} bytes"))),
            }
        };
    }
    apply!(
        5 => U5, 6 => U6, 7 => U7, 8 => U8, 9 => U9, 10 => U10,
        11 => U11, 12 => U12, 13 => U13, 14 => U14, 15 => U15, 16 => U16,
    );

    Ok(output)
}

/// AES-CBC with the IV in the first block and PKCS#7 padding.
fn aes_cbc_decrypt(key: &[u8], data: &[u8]) -> AppResult<Vec<u8>> {
    if data.len() < AES_BLOCK {
        return Ok(Vec::new());
    }
    let (iv, ciphertext) = data.split_at(AES_BLOCK);
    let plain = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|error| AppError::Internal(format!("invalid AES-128 key: {error}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|error| AppError::Internal(format!("invalid AES-256 key: {error}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        other => return Err(unsupported(&format!("AES key of {other} bytes"))),
    };
    plain.map_err(|_| AppError::Validation("encrypted object has invalid padding".to_owned()))
}

fn unsupported(detail: &str) -> AppError {
    AppError::Validation(format!("unsupported PDF encryption: {detail}"))
}

fn password_required() -> AppError {
    AppError::Validation("document is encrypted and cannot be opened without a password".to_owned())
}
