// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keyword replies for the assistant when no completion is available.

/// Pick a canned reply by the first matching keyword group.
pub fn canned_reply(input: &str) -> &'static str {
    let input = input.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| input.contains(w));

    if has(&["headache", "head pain"]) {
        "Headaches can have many causes, from tension and stress to more serious conditions. How long have you been experiencing this headache? Is it accompanied by any other symptoms like nausea, sensitivity to light, or visual disturbances?"
    } else if has(&["fever", "temperature"]) {
        "A fever is often a sign that your body is fighting an infection. What's your temperature reading? Are you experiencing any other symptoms like cough, sore throat, or body aches?"
    } else if has(&["cough", "cold"]) {
        "Coughs can be caused by various conditions from common colds to bronchitis. Is your cough dry or productive (bringing up mucus)? How long have you had it? Any fever or difficulty breathing?"
    } else if has(&["pain"]) {
        "I understand you're experiencing pain. Could you describe where exactly you feel the pain, how severe it is on a scale of 1-10, and whether it's constant or comes and goes?"
    } else if has(&["hello", "hi", "hey"]) {
        "Hello! I'm your AI medical assistant. I can help answer medical questions or discuss symptoms you might be experiencing. How can I assist you today?"
    } else if has(&["thank"]) {
        "You're welcome! If you have any other medical questions or concerns, feel free to ask. I'm here to help."
    } else {
        "Thank you for sharing that information. To provide better guidance, could you tell me more about your symptoms? When did they start, and have you noticed any patterns or triggers?"
    }
}
