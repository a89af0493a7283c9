use indoc::formatdoc;
use protocol::TranslateRequest;

const TEXT: &str = "{{text}}";
const SOURCE_LANG: &str = "{{sourceLang}}";
const TARGET_LANG: &str = "{{targetLang}}";

/// Substitutes `{{text}}`, then `{{sourceLang}}`, then `{{targetLang}}` in a user template.
///
/// Language placeholders inside the substituted text are expanded too.
/// Unknown `{{...}}` sequences are kept as is.
pub fn build_prompt(template: &str, request: &TranslateRequest) -> String {
    template
        .replace(TEXT, &request.text)
        .replace(SOURCE_LANG, request.source_lang())
        .replace(TARGET_LANG, request.target_lang())
}

/// English name of a language code, or the code itself when unknown.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ko" => "Korean",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        _ => code,
    }
}

/// Complete TranslateGemma turn, left open at the model marker.
pub fn translategemma_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    let source_name = language_name(source_lang);
    let target_name = language_name(target_lang);
    let text = text.trim();

    formatdoc!(
        "
        <bos><start_of_turn>user
        You are a professional {source_name} ({source_lang}) to {target_name} ({target_lang}) translator. Your goal is to accurately convey the meaning and nuances of the original {source_name} text while adhering to {target_name} grammar, vocabulary, and cultural sensitivities.
        Produce only the {target_name} translation, without any additional explanations or commentary. Please translate the following {source_name} text into {target_name}:


        {text}<end_of_turn>
        <start_of_turn>model
        "
    )
}

/// PLaMo translate directive block, left open at the output section.
pub fn plamo_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    let text = text.trim();

    formatdoc!(
        "
        <|plamo:op|>dataset
        translation
        <|plamo:op|>input lang={source_lang}
        {text}
        <|plamo:op|>output lang={target_lang}
        "
    )
}
