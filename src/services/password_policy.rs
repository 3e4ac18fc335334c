//! Password strength checks applied at registration and password change.
//!
//! Every failing check is reported, so a client can show all problems at once.

use thiserror::Error;

use crate::config::PasswordPolicyConfig;

/// A single failed password check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordViolation {
    #[error("This password is too short. It must contain at least {min} characters.")]
    TooShort { min: usize },

    #[error("This password is too long. It must contain at most {max} characters.")]
    TooLong { max: usize },

    #[error("The password is too similar to the {attribute}.")]
    TooSimilar { attribute: &'static str },

    #[error("This password is too common.")]
    TooCommon,

    #[error("This password is entirely numeric.")]
    AllNumeric,
}

/// User attributes a password must not resemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserContext<'a> {
    pub email: Option<&'a str>,
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub check_common_passwords: bool,
    pub disallow_all_numeric: bool,
    pub disallow_user_attributes: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_config(&PasswordPolicyConfig::default())
    }
}

impl PasswordPolicy {
    #[must_use]
    pub const fn from_config(config: &PasswordPolicyConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            check_common_passwords: config.check_common_passwords,
            disallow_all_numeric: config.disallow_all_numeric,
            disallow_user_attributes: config.disallow_user_attributes,
        }
    }

    /// Accepts everything non-empty. Tests only.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            min_length: 1,
            max_length: usize::MAX,
            check_common_passwords: false,
            disallow_all_numeric: false,
            disallow_user_attributes: false,
        }
    }

    pub fn validate(
        &self,
        password: &str,
        user: &UserContext<'_>,
    ) -> Result<(), Vec<PasswordViolation>> {
        let violations = self.violations(password, user);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    #[must_use]
    pub fn violations(&self, password: &str, user: &UserContext<'_>) -> Vec<PasswordViolation> {
        let mut violations = Vec::new();
        let len = password.chars().count();

        if self.disallow_user_attributes
            && let Some(attribute) = similar_attribute(password, user)
        {
            violations.push(PasswordViolation::TooSimilar { attribute });
        }

        if len < self.min_length {
            violations.push(PasswordViolation::TooShort {
                min: self.min_length,
            });
        }

        if len > self.max_length {
            violations.push(PasswordViolation::TooLong {
                max: self.max_length,
            });
        }

        if self.check_common_passwords && is_common_password(password) {
            violations.push(PasswordViolation::TooCommon);
        }

        if self.disallow_all_numeric
            && !password.is_empty()
            && password.chars().all(|c| c.is_ascii_digit())
        {
            violations.push(PasswordViolation::AllNumeric);
        }

        violations
    }
}

fn similar_attribute(password: &str, user: &UserContext<'_>) -> Option<&'static str> {
    let password = password.to_lowercase();
    if password.is_empty() {
        return None;
    }

    let email_local = user.email.and_then(|e| e.split('@').next());
    let candidates = [
        ("username", user.username),
        ("first name", user.first_name),
        ("last name", user.last_name),
        ("email", email_local),
    ];

    candidates.into_iter().find_map(|(name, value)| {
        let value = value?.trim().to_lowercase();
        if value.chars().count() < 3 {
            return None;
        }
        (password.contains(&value) || value.contains(&password)).then_some(name)
    })
}

fn is_common_password(password: &str) -> bool {
    let lower = password.to_lowercase();

    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        return true;
    }

    // "password123456" is as weak as "password"
    COMMON_PASSWORDS.iter().any(|common| {
        common.len() >= 4
            && lower.len() > common.len()
            && lower.starts_with(common)
            && lower[common.len()..].chars().all(|c| c.is_ascii_digit())
    })
}

static COMMON_PASSWORDS: &[&str] = &[
    "123456", "password", "12345678", "qwerty", "123456789",
    "12345", "1234", "111111", "1234567", "dragon",
    "123123", "baseball", "abc123", "football", "monkey",
    "letmein", "696969", "shadow", "master", "666666",
    "qwertyuiop", "123321", "mustang", "1234567890", "michael",
    "654321", "abcdef", "superman", "1qaz2wsx", "7777777",
    "iloveu", "121212", "000000", "qazwsx", "123qwe",
    "killer", "trustno1", "jordan", "jennifer", "zxcvbnm",
    "asdfgh", "hunter", "buster", "soccer", "harley",
    "batman", "andrew", "tigger", "sunshine", "iloveyou",
    "qwerty1", "2000", "charlie", "robert", "thomas",
    "hockey", "ranger", "daniel", "starwars", "klaster",
    "112233", "george", "football1", "computer", "michelle",
    "jessica", "pepper", "1111", "zxcvbn", "555555",
    "11111111", "131313", "freedom", "777777", "pass",
    "test123", "maggie", "159753", "aaaaaa", "ginger",
    "princess", "joshua", "cheese", "amanda", "summer",
    "love", "ashley", "6969", "nicole", "chelsea",
    "biteme", "matthew", "access", "yankees", "987654321",
    "dallas", "austin", "thunder", "taylor", "matrix",
    "minecraft", "william", "corvette", "hello", "martin",
    "heather", "secret", "merlin", "diamond", "1234qwer",
    "gfhjkm", "hammer", "silver", "222222", "88888888",
    "anthony", "justin", "test", "bailey", "q1w2e3r4t5",
    "patrick", "internet", "scooter", "orange", "11111",
    "golfer", "cookie", "richard", "samantha", "bigdog",
    "guitar", "jackson", "whatever", "mickey", "chicken",
    "sparky", "snoopy", "maverick", "phoenix", "camaro",
    "peanut", "morgan", "welcome", "falcon", "cowboy",
    "ferrari", "samsung", "andrea", "smokey", "steelers",
    "joseph", "mercedes", "dakota", "arsenal", "eagles",
    "melissa", "boomer", "booboo", "spider", "nascar",
    "monster", "tigers", "yellow", "xxxxxx", "123123123",
    "gateway", "marina", "diablo", "bulldog", "qwer1234",
    "compaq", "purple", "hardcore", "banana", "junior",
    "hannah", "123654", "porsche", "lakers", "iceman",
    "money", "cowboys", "987654", "london", "tennis",
    "999999", "ncc1701", "coffee", "scooby", "0000",
    "miller", "boston", "q1w2e3r4", "brandon", "yamaha",
    "chester", "mother", "forever", "johnny", "edward",
    "333333", "oliver", "redsox", "player", "nikita",
    "knight", "fender", "barney", "midnight", "please",
    "brandy", "chicago", "badboy", "slayer", "rangers",
    "charles", "angel", "flower", "rabbit", "wizard",
    "sunflower", "jasper", "enter", "rachel", "chris",
    "steven", "winner", "adidas", "victoria", "natasha",
    "1q2w3e4r", "jasmine", "winter", "prince", "shopping",
    "marine", "ghbdtn", "fishing", "cocacola", "casper",
    "james", "232323", "raiders", "888888", "marlboro",
    "gandalf", "asdfasdf", "crystal", "87654321", "12344321",
    "golden", "8675309", "qwerty123", "password1", "admin",
    "admin123", "welcome1", "passw0rd", "p@ssw0rd", "changeme",
];
