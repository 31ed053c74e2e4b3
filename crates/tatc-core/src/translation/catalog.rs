//! Static engine and language catalogs.

use crate::domain::{DECODED_MORSE_LANGUAGE_ID, MORSE_CODE_ENGINE};

pub const SUPPORTED_ENGINES: &[&str] = &["google", "bing", "libretranslate", MORSE_CODE_ENGINE];

pub const GOOGLE_LANGUAGES: &[&str] = &[
    "af", "sq", "am", "ar", "hy", "az", "eu", "be", "bn", "bs", "bg", "ca", "ceb", "ny", "zh-cn",
    "zh-tw", "co", "hr", "cs", "da", "nl", "en", "eo", "et", "tl", "fi", "fr", "fy", "gl", "ka",
    "de", "el", "gu", "ht", "ha", "haw", "iw", "hi", "hmn", "hu", "is", "ig", "id", "ga", "it",
    "ja", "jw", "kn", "kk", "km", "ko", "ku", "ky", "lo", "la", "lv", "lt", "lb", "mk", "mg", "ms",
    "ml", "mt", "mi", "mr", "mn", "my", "ne", "no", "ps", "fa", "pl", "pt", "pa", "ro", "ru", "sm",
    "gd", "sr", "st", "sn", "sd", "si", "sk", "sl", "so", "es", "su", "sw", "sv", "tg", "ta", "te",
    "th", "tr", "uk", "ur", "uz", "vi", "cy", "xh", "yi", "yo", "zu",
];

pub const BING_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "ba", "bg", "bn", "bo", "bs", "ca", "cs", "cy", "da", "de",
    "dv", "el", "en", "es", "et", "eu", "fa", "fi", "fil", "fj", "fo", "fr", "fr-ca", "ga", "gl",
    "gu", "he", "hi", "hr", "hsb", "ht", "hu", "hy", "id", "ikt", "is", "it", "iu", "ja", "ka",
    "kk", "km", "kmr", "kn", "ko", "ku", "ky", "lo", "lt", "lv", "lzh", "mg", "mi", "mk", "ml",
    "mn-cyrl", "mr", "ms", "mt", "my", "nb", "ne", "nl", "or", "otq", "pa", "pl", "prs", "ps",
    "pt", "pt-pt", "ro", "ru", "sk", "sl", "sm", "so", "sq", "sr-cyrl", "sr-latn", "sv", "sw",
    "ta", "te", "th", "ti", "tk", "tlh-latn", "to", "tr", "tt", "ty", "ug", "uk", "ur", "uz",
    "vi", "yua", "yue", "zh-hans", "zh-hant", "zu",
];

pub const GENERIC_LANGUAGES: &[&str] = &[
    "ar", "az", "cs", "da", "de", "el", "en", "eo", "es", "fa", "fi", "fr", "ga", "he", "hi",
    "hu", "id", "it", "ja", "ko", "nl", "pl", "pt", "ru", "sk", "sv", "tr", "uk", "zh",
];

pub const MORSE_LANGUAGES: &[&str] = &[DECODED_MORSE_LANGUAGE_ID];
