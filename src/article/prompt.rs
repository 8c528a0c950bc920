/// Instruction sent ahead of the transcript. The article is always written in Russian.
const INSTRUCTION: &str = "Преобразуй этот транскрипт YouTube видео в хорошо структурированную статью на русском языке.

ВАЖНО:
- Если транскрипт на английском - переведи на русский
- Создай понятную структуру с заголовками
- Убери повторы и \"мусорные\" слова
- Сделай текст читаемым и связным
- Добавь краткое введение и заключение
- Используй markdown форматирование (## для заголовков, **для выделения**)";

const CLOSING: &str =
    "Ответь ТОЛЬКО готовой статьёй в формате markdown, без дополнительных комментариев.";

/// Build the single user message for the rewriting service
pub fn build_prompt(transcript: &str) -> String {
    format!("{INSTRUCTION}\n\nТранскрипт:\n{transcript}\n\n{CLOSING}")
}
