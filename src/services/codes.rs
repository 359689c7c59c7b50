use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub(crate) const CLASS_CODE_LEN: usize = 4;

/// Uniform 4-character class code. Uniqueness is not guaranteed here; the
/// classroom repository rejects duplicates and callers retry generation.
pub(crate) fn generate_class_code() -> String {
    random_code(CLASS_CODE_LEN)
}

pub(crate) fn generate_student_id() -> String {
    format!("S-{}", random_code(4))
}

pub(crate) fn generate_teacher_id() -> String {
    format!("T-{}", random_code(4))
}

fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(len);
    for _ in 0..len {
        let index = rng.gen_range(0..ALPHABET.len());
        output.push(ALPHABET[index] as char);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_code_is_four_uppercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate_class_code();
            assert_eq!(code.len(), CLASS_CODE_LEN);
            assert!(code.bytes().all(|byte| ALPHABET.contains(&byte)), "code: {code}");
        }
    }

    #[test]
    fn participant_ids_are_role_prefixed() {
        let student = generate_student_id();
        assert!(student.starts_with("S-"));
        assert_eq!(student.len(), 6);

        let teacher = generate_teacher_id();
        assert!(teacher.starts_with("T-"));
        assert_eq!(teacher.len(), 6);
    }
}
