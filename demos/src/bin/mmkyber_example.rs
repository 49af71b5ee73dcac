use mmkyber::{
    decapsulate, decapsulate_with, decrypt, encapsulate, encrypt, keygen, setup, DecryptionPath,
    Message, SecurityLevel, SharedCiphertext,
};
use rand::{rngs::OsRng, RngCore};

const RECIPIENTS: usize = 4;

fn random_bytes<const L: usize>(rng: &mut OsRng) -> [u8; L] {
    let mut out = [0u8; L];
    rng.fill_bytes(&mut out);
    out
}

fn main() -> mmkyber::Result<()> {
    println!("mmKyber Multi-Recipient Example");
    println!("===============================");

    let mut rng = OsRng;

    // Choose a security level
    let level = SecurityLevel::Level128;
    let params = level.params();
    println!("Parameter set: {} (m = {}, n = {})", params.name(mmkyber::Mode::Kem), params.m, params.n);

    // Everyone derives the same public matrix from a shared seed
    let seed_a = random_bytes::<16>(&mut rng);
    let pp = setup(level, &seed_a);
    println!("Public matrix seed: {}", hex::encode(seed_a));

    let mut pks = Vec::new();
    let mut sks = Vec::new();
    for _ in 0..RECIPIENTS {
        let (pk, sk) = keygen(&pp, &random_bytes::<32>(&mut rng))?;
        pks.push(pk);
        sks.push(sk);
    }
    println!(
        "Generated {} key pairs ({} byte public keys, {} byte secret keys)",
        RECIPIENTS,
        params.public_key_bytes(),
        params.secret_key_bytes()
    );

    // First, encapsulate one session key per recipient
    println!("\nKey encapsulation:");
    println!("------------------");

    let enc = encapsulate(&pp, &pks, &random_bytes::<32>(&mut rng))?;
    let ct = &enc.ciphertext;
    println!(
        "Ciphertext: {} bytes shared + {} x {} bytes individual = {} bytes",
        ct.shared().as_bytes().len(),
        ct.len(),
        params.individual_ciphertext_bytes(mmkyber::Mode::Kem),
        ct.to_bytes().len()
    );

    for (i, sk) in sks.iter().enumerate() {
        let Some(individual) = ct.individual(i) else {
            continue;
        };
        let key = decapsulate(sk, ct.shared(), individual)?;
        let status = if key == enc.keys[i] { "match" } else { "MISMATCH" };
        println!(
            "Recipient {}: {}... ({})",
            i,
            hex::encode(&key.as_bytes()[0..8]),
            status
        );
    }

    // Both decryption strategies recover the same key
    if let Some(individual) = ct.individual(0) {
        let via_ntt = decapsulate_with(DecryptionPath::Ntt, &sks[0], ct.shared(), individual)?;
        println!("NTT decryption path agrees: {}", via_ntt == enc.keys[0]);
    }

    // Next, encrypt a separate message to each recipient
    println!("\nMulti-message encryption:");
    println!("-------------------------");

    let messages: Vec<Message> = (0..RECIPIENTS).map(|_| random_bytes::<32>(&mut rng)).collect();
    let ct = encrypt(&pp, &pks, &messages, &random_bytes::<32>(&mut rng))?;
    println!("Ciphertext: {} bytes for {} messages", ct.to_bytes().len(), ct.len());

    for (i, sk) in sks.iter().enumerate() {
        let Some(individual) = ct.individual(i) else {
            continue;
        };
        let m = decrypt(sk, ct.shared(), individual)?;

        // Count the number of differing bits
        let bit_diffs: u32 = m
            .iter()
            .zip(messages[i].iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        println!(
            "Recipient {}: {}... ({} bit differences)",
            i,
            hex::encode(&m[0..8]),
            bit_diffs
        );
    }

    // Tampering with the shared part changes every recipient's view
    println!("\nTampering with the shared ciphertext:");
    println!("-------------------------------------");

    let mut tampered = ct.shared().as_bytes().to_vec();
    for byte in tampered.iter_mut().take(params.shared_ciphertext_bytes() / 4) {
        *byte ^= 0x55;
    }
    let tampered = SharedCiphertext::from_bytes(level, &tampered)?;
    if let Some(individual) = ct.individual(0) {
        let m = decrypt(&sks[0], &tampered, individual)?;
        if m == messages[0] {
            println!("Tampered ciphertext still decrypted to the original message");
        } else {
            println!("Tampered ciphertext decrypted to a different message");
            println!("mmKyber is only IND-CPA secure: integrity must come from elsewhere.");
        }
    }

    Ok(())
}
